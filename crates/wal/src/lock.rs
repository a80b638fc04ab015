// SPDX-License-Identifier: MIT

//! Exclusive single-writer locking for a WAL directory: an `flock`-style
//! lock on `wal.lock` plus a `wal.pid` breadcrumb naming the holder.

use fs2::FileExt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Holds the exclusive lock on a WAL directory for as long as it lives.
/// Dropping it releases the OS-level lock.
pub struct WalLock {
    _file: File,
}

impl WalLock {
    /// Acquire the lock at `<dir>/wal.lock`, writing `<dir>/wal.pid` once
    /// held. Returns the PID found in a stale pid file if acquisition fails.
    pub fn acquire(dir: &Path) -> Result<Self, (io::Error, Option<u32>)> {
        let lock_path = dir.join("wal.lock");
        let file = File::create(&lock_path).map_err(|e| (e, None))?;
        if let Err(e) = file.try_lock_exclusive() {
            let pid = read_pid(&dir.join("wal.pid"));
            return Err((e, pid));
        }
        write_pid(dir, std::process::id())
            .map_err(|e| (e, None))?;
        Ok(Self { _file: file })
    }
}

fn write_pid(dir: &Path, pid: u32) -> io::Result<()> {
    let path = dir.join("wal.pid");
    let tmp_path = dir.join("wal.pid.tmp");
    {
        let mut file = File::create(&tmp_path)?;
        write!(file, "{pid}")?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, &path)
}

fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}
