//! In-memory key-value table

use std::collections::HashMap;
use tracing::trace;

/// Initial number of slots reserved when the table is created.
const INITIAL_CAPACITY: usize = 64;

/// One key/value pair held by the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    key: String,
    value: String,
}

/// Failure outcomes of table operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    #[error("key not found: {0}")]
    NotFound(String),

    /// The slot for `key` holds an entry recorded under a different key.
    #[error("entry stored under {key:?} carries key {found:?}")]
    Corrupted { key: String, found: String },
}

/// Hash-indexed table of entries.
///
/// Entries only come and go through explicit mutations; nothing is evicted.
#[derive(Debug)]
pub struct Table {
    entries: HashMap<String, Entry>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Table {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Create a new entry, failing if the key is already present
    pub fn insert(&mut self, key: String, value: String) -> Result<(), TableError> {
        if self.entries.contains_key(&key) {
            return Err(TableError::AlreadyExists(key));
        }

        trace!("table insert {}", key);
        let entry = Entry {
            key: key.clone(),
            value,
        };
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Replace the value of an existing entry
    pub fn update(&mut self, key: &str, value: String) -> Result<(), TableError> {
        let entry = self.entry_mut(key)?;
        entry.value = value;
        trace!("table update {}", key);
        Ok(())
    }

    /// Destroy an existing entry
    pub fn remove(&mut self, key: &str) -> Result<(), TableError> {
        match self.entries.remove(key) {
            Some(entry) if entry.key != key => Err(TableError::Corrupted {
                key: key.to_string(),
                found: entry.key,
            }),
            Some(_) => {
                trace!("table remove {}", key);
                Ok(())
            }
            None => Err(TableError::NotFound(key.to_string())),
        }
    }

    /// Look up the value stored under `key`
    pub fn get(&self, key: &str) -> Result<&str, TableError> {
        match self.entries.get(key) {
            Some(entry) if entry.key != key => Err(TableError::Corrupted {
                key: key.to_string(),
                found: entry.key.clone(),
            }),
            Some(entry) => Ok(&entry.value),
            None => Err(TableError::NotFound(key.to_string())),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries the table can hold before reallocating
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    fn entry_mut(&mut self, key: &str) -> Result<&mut Entry, TableError> {
        match self.entries.get_mut(key) {
            Some(entry) if entry.key != key => Err(TableError::Corrupted {
                key: key.to_string(),
                found: entry.key.clone(),
            }),
            Some(entry) => Ok(entry),
            None => Err(TableError::NotFound(key.to_string())),
        }
    }

    /// Rewrite the key recorded inside an entry without moving its slot.
    #[cfg(test)]
    pub(crate) fn corrupt(&mut self, key: &str, recorded_key: &str) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.key = recorded_key.to_string();
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(pairs: &[(&str, &str)]) -> Table {
        let mut table = Table::new();
        for (key, value) in pairs {
            table.insert(key.to_string(), value.to_string()).unwrap();
        }
        table
    }

    #[test]
    fn insert_rejects_existing_key_until_removed() {
        let mut table = table_with(&[("a", "1")]);

        assert_eq!(
            table.insert("a".into(), "2".into()),
            Err(TableError::AlreadyExists("a".into()))
        );
        assert_eq!(table.get("a"), Ok("1"));

        table.remove("a").unwrap();
        table.insert("a".into(), "2".into()).unwrap();
        assert_eq!(table.get("a"), Ok("2"));
    }

    #[test]
    fn update_requires_existing_key() {
        let mut table = Table::new();

        assert_eq!(
            table.update("ghost", "x".into()),
            Err(TableError::NotFound("ghost".into()))
        );
        assert!(!table.contains_key("ghost"));
        assert!(table.is_empty());
    }

    #[test]
    fn update_replaces_value_and_keeps_key() {
        let mut table = table_with(&[("x", "10")]);

        table.update("x", "20".into()).unwrap();

        assert_eq!(table.get("x"), Ok("20"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_of_absent_key_leaves_table_unchanged() {
        let mut table = table_with(&[("keep", "v")]);

        assert_eq!(
            table.remove("gone"),
            Err(TableError::NotFound("gone".into()))
        );
        assert_eq!(table.get("keep"), Ok("v"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn get_returns_defined_value() {
        let table = table_with(&[("k", "v"), ("other", "w")]);

        assert_eq!(table.get("k"), Ok("v"));
        assert_eq!(table.get("missing"), Err(TableError::NotFound("missing".into())));
    }

    #[test]
    fn capacity_grows_without_evicting() {
        let mut table = Table::with_capacity(4);
        let initial = table.capacity();

        for i in 0..1_000 {
            table.insert(format!("key{i}"), i.to_string()).unwrap();
        }

        assert!(table.capacity() >= initial);
        assert_eq!(table.len(), 1_000);
        assert_eq!(table.get("key0"), Ok("0"));
        assert_eq!(table.get("key999"), Ok("999"));
    }

    #[test]
    fn mismatched_entry_key_is_reported_as_corruption() {
        let mut table = table_with(&[("a", "1")]);
        table.corrupt("a", "b");

        assert_eq!(
            table.get("a"),
            Err(TableError::Corrupted {
                key: "a".into(),
                found: "b".into()
            })
        );
        assert!(matches!(
            table.update("a", "2".into()),
            Err(TableError::Corrupted { .. })
        ));
    }
}
