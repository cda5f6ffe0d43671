//! Applies decoded commands to the table

use crate::protocol::{Command, Reply};
use crate::storage::{Table, TableError};
use tracing::{debug, error};

/// Sole owner of the table; every mutation goes through [`Dispatcher::apply`].
pub struct Dispatcher {
    table: Table,
    ops_count: u64,
}

impl Dispatcher {
    /// Create a dispatcher owning an empty table
    pub fn new() -> Self {
        Self::with_table(Table::new())
    }

    pub fn with_table(table: Table) -> Self {
        Dispatcher {
            table,
            ops_count: 0,
        }
    }

    /// Apply one command and produce its reply.
    ///
    /// Expected table outcomes map onto `NotFound` / `AlreadyExists`; only a
    /// corrupted table yields `InternalError`.
    pub fn apply(&mut self, command: Command) -> Reply {
        debug!("Executing command: {}", command.name());
        let mutation = command.is_mutation();

        let outcome = match command {
            Command::Define { key, value } => self.table.insert(key, value).map(|()| None),
            Command::Update { key, value } => self.table.update(&key, value).map(|()| None),
            Command::Drop { key } => self.table.remove(&key).map(|()| None),
            Command::Get { key } => self.table.get(&key).map(|value| Some(value.to_string())),
        };

        match outcome {
            Ok(value) => {
                if mutation {
                    self.ops_count += 1;
                }
                Reply::Ok(value)
            }
            Err(TableError::AlreadyExists(key)) => {
                debug!("{} already exists", key);
                Reply::AlreadyExists
            }
            Err(TableError::NotFound(key)) => {
                debug!("{} not found", key);
                Reply::NotFound
            }
            Err(e @ TableError::Corrupted { .. }) => {
                error!("Table invariant violated: {}", e);
                Reply::InternalError
            }
        }
    }

    /// Number of mutations applied successfully
    pub fn ops_count(&self) -> u64 {
        self.ops_count
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
