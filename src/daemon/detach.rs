//! Detaching from the controlling terminal

use crate::Result;
use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, chdir, dup2, fork, setsid};
use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use tracing::{debug, info};

/// Turn the calling process into a daemon.
///
/// Must run before any runtime or other thread is started. The parent exits
/// without running destructors so descriptors shared with the child, such
/// as the singleton lock, stay held.
pub fn daemonize() -> Result<()> {
    // SAFETY: the process is still single-threaded at this point.
    match unsafe { fork() }.map_err(io::Error::from)? {
        ForkResult::Parent { child } => {
            info!("Detached; daemon running as pid {}", child);
            std::process::exit(0);
        }
        ForkResult::Child => {}
    }

    setsid().map_err(io::Error::from)?;
    chdir("/").map_err(io::Error::from)?;
    umask(Mode::empty());
    redirect_stdio()?;

    debug!("Daemonization complete");
    Ok(())
}

fn redirect_stdio() -> Result<()> {
    let null = OpenOptions::new().read(true).write(true).open("/dev/null")?;
    for fd in 0..=2 {
        dup2(null.as_raw_fd(), fd).map_err(io::Error::from)?;
    }
    Ok(())
}
