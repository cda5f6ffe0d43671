//! Termination signal handling

use crate::Result;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::info;

/// Resolves once the process is asked to stop.
///
/// SIGINT and SIGTERM end the wait. SIGHUP is acknowledged and ignored so a
/// detached daemon survives its session going away.
pub struct Shutdown {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

impl Shutdown {
    /// Install the handlers; requires a running tokio runtime
    pub fn register() -> Result<Self> {
        Ok(Shutdown {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    pub async fn wait(mut self) {
        loop {
            tokio::select! {
                _ = self.interrupt.recv() => {
                    info!("Received SIGINT");
                    return;
                }
                _ = self.terminate.recv() => {
                    info!("Received SIGTERM");
                    return;
                }
                _ = self.hangup.recv() => {
                    info!("Received SIGHUP; ignoring");
                }
            }
        }
    }
}
