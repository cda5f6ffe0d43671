//! Process lifecycle around the core: singleton lock, detaching, signals

pub mod detach;
pub mod lock;
pub mod signal;

pub use detach::daemonize;
pub use lock::SingletonGuard;
pub use signal::Shutdown;
