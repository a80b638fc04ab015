// SPDX-License-Identifier: MIT

use crate::migration::{MigrationError, MigrationRegistry};
use crate::record::StoreRecord;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use ward_core::Clock;

const SEVEN_DAYS_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("serialised record size {size} exceeds maximum {max}")]
    SizeExceeded { size: usize, max: usize },
    #[error("schema migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Per-store configuration: the schema version this process expects, and
/// a size ceiling enforced on every write.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub schema_version: u32,
    pub max_size_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { schema_version: 1, max_size_bytes: 10 * 1024 * 1024 }
    }
}

enum Source {
    Primary,
    Backup,
    Tmp(PathBuf),
}

/// Crash-safe persistence of one typed value per store file (§4.2).
///
/// `T` is the caller's payload type; it is serialised into the record's
/// remaining (non-reserved) fields.
pub struct ResilientStore<T, C: Clock> {
    path: PathBuf,
    config: StoreConfig,
    migrations: MigrationRegistry,
    clock: C,
    write_lock: Mutex<()>,
    _marker: PhantomData<T>,
}

impl<T, C> ResilientStore<T, C>
where
    T: Serialize + DeserializeOwned + Clone,
    C: Clock,
{
    pub fn new(path: PathBuf, config: StoreConfig, migrations: MigrationRegistry, clock: C) -> Self {
        Self { path, config, migrations, clock, write_lock: Mutex::new(()), _marker: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        append_suffix(&self.path, ".bak")
    }

    fn tmp_path(&self, pid: u32) -> PathBuf {
        append_suffix(&self.path, &format!(".{pid}.tmp"))
    }

    fn quarantine_path(&self, epoch_ms: u64, variant: &str) -> PathBuf {
        append_suffix(&self.path, &format!(".quarantine.{epoch_ms}.{variant}"))
    }

    /// Read the current value, or `None` if absent or unrecoverable.
    /// Never fails due to corruption — corrupt candidates are quarantined
    /// and `get()` reports absent instead.
    pub fn get(&self) -> Result<Option<T>, StoreError> {
        let _guard = self.write_lock.lock();
        let primary = self.try_read(&self.path);
        let backup = self.try_read(&self.backup_path());
        let tmp_entries = self.list_tmp_entries()?;
        let valid_tmps: Vec<(&PathBuf, &StoreRecord)> =
            tmp_entries.iter().filter_map(|(p, r)| r.as_ref().map(|r| (p, r))).collect();
        let best_tmp = valid_tmps.iter().max_by_key(|(_, r)| r.write_epoch).copied();

        let baseline: Option<(Source, &StoreRecord)> = if let Some(r) = primary.as_ref() {
            Some((Source::Primary, r))
        } else {
            backup.as_ref().map(|r| (Source::Backup, r))
        };

        let use_tmp = match (&baseline, best_tmp) {
            (Some((_, base)), Some((_, tmp))) => tmp.write_epoch > base.write_epoch,
            (None, Some(_)) => true,
            _ => false,
        };

        let chosen = if use_tmp {
            best_tmp.map(|(path, record)| (Source::Tmp(path.clone()), record.clone()))
        } else {
            baseline.map(|(source, record)| (source, record.clone()))
        };

        // Stale valid tmps (not chosen) never serve as truth again; remove them.
        let chosen_tmp_path = match &chosen {
            Some((Source::Tmp(p), _)) => Some(p.clone()),
            _ => None,
        };
        for (path, record) in &tmp_entries {
            if record.is_some() && Some(path) != chosen_tmp_path.as_ref() {
                let _ = fs::remove_file(path);
            }
        }

        match chosen {
            Some((_, record)) => Ok(Some(self.decode(record)?)),
            None => {
                self.quarantine_unreadable(&primary, &backup, &tmp_entries)?;
                Ok(None)
            }
        }
    }

    /// Highest `write_epoch` among the primary, the backup, and any
    /// parseable tmp sibling. `set()` must start its next epoch from this,
    /// not from the primary alone — otherwise a stale tmp left behind by an
    /// interrupted write under a different pid can carry an epoch higher
    /// than the one just written, and the next `get()` would resurrect it.
    fn max_known_epoch(&self) -> Result<u64, StoreError> {
        let primary = self.try_read(&self.path).map(|r| r.write_epoch);
        let backup = self.try_read(&self.backup_path()).map(|r| r.write_epoch);
        let tmp = self.list_tmp_entries()?.into_iter().filter_map(|(_, r)| r.map(|r| r.write_epoch)).max();
        Ok([primary, backup, tmp].into_iter().flatten().max().unwrap_or(0))
    }

    /// Atomically persist `value`, bumping the write epoch.
    pub fn set(&self, value: &T) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        let next_epoch = self.max_known_epoch()? + 1;

        let payload = serde_json::to_value(value)?;
        let record = StoreRecord::new(self.config.schema_version, next_epoch, payload);
        let bytes = record.to_canonical_bytes()?;
        if bytes.len() > self.config.max_size_bytes {
            return Err(StoreError::SizeExceeded { size: bytes.len(), max: self.config.max_size_bytes });
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path(std::process::id());
        let result = self.write_atomic(&tmp_path, &bytes);
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    fn write_atomic(&self, tmp_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        {
            let mut file = fs::File::create(tmp_path)?;
            use std::io::Write;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        // Best-effort: first write has no prior primary to back up.
        if self.path.exists() {
            let _ = fs::rename(&self.path, self.backup_path());
        }

        fs::rename(tmp_path, &self.path)?;

        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove the store's primary, backup, and any tmp/quarantine siblings.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        for path in self.all_sibling_paths()? {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Delete quarantine files older than seven days. Returns the count removed.
    pub fn cleanup_quarantine(&self) -> Result<usize, StoreError> {
        let now = self.clock.epoch_ms();
        let mut removed = 0;
        let Some(parent) = self.path.parent() else { return Ok(0) };
        let prefix = format!("{}.quarantine.", file_name_string(&self.path));
        if !parent.exists() {
            return Ok(0);
        }
        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(rest) = name.strip_prefix(&prefix) {
                let epoch_part = rest.split('.').next().unwrap_or("");
                if let Ok(epoch_ms) = epoch_part.parse::<u64>() {
                    if now.saturating_sub(epoch_ms) > SEVEN_DAYS_MS {
                        let _ = fs::remove_file(entry.path());
                        removed += 1;
                    }
                }
            }
        }
        Ok(removed)
    }

    fn decode(&self, record: StoreRecord) -> Result<T, StoreError> {
        let payload = if record.schema_version < self.config.schema_version {
            self.migrations.migrate_to(record.payload, record.schema_version, self.config.schema_version)?
        } else {
            record.payload
        };
        let value: T = serde_json::from_value(payload.clone())?;
        if record.schema_version < self.config.schema_version {
            // Write the migrated form back immediately so subsequent reads
            // are already at the current version.
            let _ = self.set(&value);
        }
        Ok(value)
    }

    fn try_read(&self, path: &Path) -> Option<StoreRecord> {
        let bytes = fs::read(path).ok()?;
        let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        StoreRecord::from_json(value)
    }

    /// Every `.tmp` sibling file found on disk, each paired with its
    /// parsed record if it parsed cleanly (`None` means corrupt/unreadable).
    fn list_tmp_entries(&self) -> Result<Vec<(PathBuf, Option<StoreRecord>)>, StoreError> {
        let Some(parent) = self.path.parent() else { return Ok(Vec::new()) };
        if !parent.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}.", file_name_string(&self.path));
        let mut out = Vec::new();
        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name.ends_with(".tmp") {
                let record = self.try_read(&entry.path());
                out.push((entry.path(), record));
            }
        }
        Ok(out)
    }

    fn all_sibling_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut paths = vec![self.path.clone(), self.backup_path()];
        for (path, _) in self.list_tmp_entries()? {
            paths.push(path);
        }
        paths.retain(|p| p.exists());
        Ok(paths)
    }

    fn quarantine_unreadable(
        &self,
        primary: &Option<StoreRecord>,
        backup: &Option<StoreRecord>,
        tmp_entries: &[(PathBuf, Option<StoreRecord>)],
    ) -> Result<(), StoreError> {
        let now = self.clock.epoch_ms();
        if primary.is_none() && self.path.exists() {
            let _ = fs::rename(&self.path, self.quarantine_path(now, "primary"));
            warn!(path = %self.path.display(), "quarantined unreadable primary store file");
        }
        let backup_path = self.backup_path();
        if backup.is_none() && backup_path.exists() {
            let _ = fs::rename(&backup_path, self.quarantine_path(now, "backup"));
        }
        // Every tmp entry reaching this point failed to parse — a parseable
        // tmp would already have been selected as the chosen source above.
        for (path, _) in tmp_entries {
            let _ = fs::rename(path, self.quarantine_path(now, "tmp"));
        }
        Ok(())
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

fn file_name_string(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

/// Suggested default lease-warning interval for the write mutex (§5):
/// logged as a diagnostic only, never releases the lease.
pub const DEFAULT_LEASE_WARNING: Duration = Duration::from_secs(30);

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
