// SPDX-License-Identifier: MIT

//! Data-directory-level exclusive lock ("Lock Manager", §4.1). Prevents two
//! process instances from operating on the same `dataDir` concurrently.

use crate::error::BootError;
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Holds an exclusive `flock` on `<data_dir>/ward.lock` for the process
/// lifetime. Dropping it releases the OS-level lock; the PID breadcrumb is
/// left on disk so a stale lock can be diagnosed by an operator.
pub struct ProcessLock {
    path: PathBuf,
    file: fs::File,
}

impl ProcessLock {
    /// Acquire the lock, writing our PID into the lock file. Returns
    /// `BootError::Locked` with the breadcrumb PID (if readable) when
    /// another live process already holds it.
    pub fn acquire(data_dir: &Path) -> Result<Self, BootError> {
        let path = data_dir.join("ward.lock");
        let file = OpenOptions::new().write(true).create(true).truncate(false).open(&path)?;
        file.try_lock_exclusive().map_err(|_| BootError::Locked { pid: Self::read_pid(&path) })?;

        let mut file = file;
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;
        Ok(Self { path, file })
    }

    fn read_pid(path: &Path) -> Option<u32> {
        let mut contents = String::new();
        fs::File::open(path).ok()?.read_to_string(&mut contents).ok()?;
        contents.trim().parse().ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
