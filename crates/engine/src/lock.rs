//! Mutual exclusion between engine runs: one advisory exclusive lock on a
//! well-known file, held for the whole run. A maintenance tick gives up
//! immediately when another run is active; a torrent-done callback waits.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::EngineError;
use crate::Result;

pub struct RunLock {
    file: File,
}

impl RunLock {
    /// Acquire the lock on `path`. With `wait` false, contention yields
    /// `Ok(None)` instead of blocking.
    pub fn acquire(path: &Path, wait: bool) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|err| EngineError::io(path, err))?;

        if wait {
            file.lock_exclusive()
                .map_err(|err| EngineError::io(path, err))?;
        } else if let Err(err) = file.try_lock_exclusive() {
            if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Ok(None);
            }
            return Err(EngineError::io(path, err));
        }

        tracing::debug!(path = %path.display(), "lock acquired");
        Ok(Some(Self { file }))
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
