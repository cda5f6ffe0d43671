//! Keyvo - A small key-value caching daemon
//!
//! This crate provides the pieces of a single-node cache reachable over UDP:
//! - In-memory table with DEFINE / UPDATE / DROP / GET semantics
//! - Line protocol codec for request and reply datagrams
//! - Single-threaded request loop owning the listening socket
//! - Process scaffolding: configuration, singleton lock, daemonization

pub mod client;
pub mod config;
pub mod daemon;
pub mod protocol;
pub mod server;
pub mod storage;

pub use client::UdpClient;
pub use config::Config;
pub use protocol::{Codec, Command, DecodeError, Limits, Reply};
pub use server::{Dispatcher, EventSink, TracingSink, UdpServer};
pub use storage::{Table, TableError};

use std::path::PathBuf;
use std::time::Duration;

/// Result type for keyvo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for keyvo
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Another instance holds the lock file {}", .0.display())]
    AlreadyRunning(PathBuf),

    #[error("No reply within {0:?}")]
    Timeout(Duration),
}
