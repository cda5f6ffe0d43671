//! Storage module for the in-memory table

pub mod table;

pub use table::{Table, TableError};
