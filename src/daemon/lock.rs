//! Single-instance lock file

use crate::{Error, Result};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

const LOCK_MODE: u32 = 0o644;

/// Exclusive advisory lock held for the life of the process.
///
/// The kernel drops the lock when the last descriptor closes, so a crashed
/// instance never leaves a stale lock behind and the file is not unlinked.
pub struct SingletonGuard {
    lock: Flock<File>,
    path: PathBuf,
}

impl SingletonGuard {
    /// Take the lock at `path`, creating the file if needed
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(LOCK_MODE)
            .open(&path)?;

        let lock = Flock::lock(file, FlockArg::LockExclusiveNonblock).map_err(|(_, errno)| {
            if errno == Errno::EWOULDBLOCK {
                error!("Cannot lock {:?}: another instance is running", path);
                Error::AlreadyRunning(path.clone())
            } else {
                Error::Io(errno.into())
            }
        })?;

        debug!("Acquired lock file {:?}", path);
        Ok(SingletonGuard { lock, path })
    }

    /// Overwrite the lock file contents with the current process id
    pub fn record_pid(&mut self) -> Result<()> {
        let file: &mut File = &mut self.lock;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_data()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
