//! Advisory single-writer lock for a log file.
//!
//! The chain logic itself assumes one writer.  Callers that might race hold
//! a `LogLock` around the whole append; the lock file is `<log>.lock`,
//! created exclusively and removed when the guard drops.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use frontdesk_contracts::{FrontDeskError, FrontDeskResult};
use frontdesk_core::fsutil::ensure_parent;

/// Held for as long as the caller writes to the log.
#[derive(Debug)]
pub struct LogLock {
    path: PathBuf,
}

impl LogLock {
    /// Take the lock for `log_path`, failing if another writer holds it.
    pub fn acquire(log_path: &Path) -> FrontDeskResult<Self> {
        ensure_parent(log_path)?;
        let path = lock_path(log_path);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(FrontDeskError::Locked {
                    path: path.display().to_string(),
                })
            }
            Err(e) => return Err(FrontDeskError::io(&path, e)),
        };

        // Owner pid, for whoever has to clear a stale lock by hand.
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            warn!(path = %path.display(), error = %e, "could not record lock owner");
        }

        debug!(path = %path.display(), "log lock acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "log lock released"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove lock file"),
        }
    }
}

fn lock_path(log_path: &Path) -> PathBuf {
    let mut name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    log_path.with_file_name(name)
}
