// SPDX-License-Identifier: MIT

use crate::checkpoint::{Checkpoint, RotationPhase};
use crate::entry::{WalEntry, WalOp};
use crate::lock::WalLock;
use crate::segment::{self, SegmentWriter};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use ward_core::{iso8601_from_epoch_ms, Clock};

#[derive(Debug, Error)]
pub enum WalError {
    #[error("wal directory is locked by pid {pid:?}")]
    Locked { pid: Option<u32> },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct WalConfig {
    pub max_segment_size: u64,
    pub max_segment_age: Duration,
    pub retention: usize,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self { max_segment_size: 10 * 1024 * 1024, max_segment_age: Duration::from_secs(3600), retention: 8 }
    }
}

/// Count of replayed entries and count of checksum/parse failures
/// encountered while replaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub replayed: usize,
    pub errors: usize,
}

/// Single-writer segmented write-ahead log (§4.3).
pub struct Wal<C: Clock> {
    dir: PathBuf,
    config: WalConfig,
    clock: C,
    _lock: WalLock,
    checkpoint: Checkpoint,
    writer: SegmentWriter,
    active_segment_opened_ms: u64,
}

impl<C: Clock> Wal<C> {
    pub fn open(dir: PathBuf, config: WalConfig, clock: C) -> Result<Self, WalError> {
        fs::create_dir_all(&dir)?;
        let lock = WalLock::acquire(&dir).map_err(|(_err, pid)| WalError::Locked { pid })?;

        let now_ms = clock.epoch_ms();
        let mut checkpoint = match Checkpoint::load(&dir)? {
            Some(checkpoint) => checkpoint,
            None => Checkpoint::fresh(1, now_ms),
        };

        let writer = SegmentWriter::open(&dir, checkpoint.active_segment_id)?;
        let phase = checkpoint.phase;
        let mut wal = Self { dir, config, clock, _lock: lock, checkpoint, writer, active_segment_opened_ms: now_ms };

        match phase {
            RotationPhase::None => {}
            RotationPhase::CheckpointWritten => {
                info!("resuming wal: clearing stale checkpoint_written phase");
                wal.checkpoint.phase = RotationPhase::None;
                wal.checkpoint.save(&wal.dir)?;
            }
            RotationPhase::Rotating => {
                info!("resuming wal: re-running interrupted rotation");
                wal.finish_rotation()?;
            }
        }
        Ok(wal)
    }

    pub fn last_seq(&self) -> u64 {
        self.checkpoint.last_seq
    }

    pub fn active_segment_id(&self) -> u64 {
        self.checkpoint.active_segment_id
    }

    pub fn segments(&self) -> &[u64] {
        &self.checkpoint.segments
    }

    /// Append one entry to the active segment, rotating first if needed.
    /// Returns the entry's sequence number.
    pub fn append(&mut self, op: WalOp, path: String, content: Option<String>) -> Result<u64, WalError> {
        self.maybe_rotate()?;
        let seq = self.checkpoint.last_seq + 1;
        let timestamp = iso8601_from_epoch_ms(self.clock.epoch_ms());
        let entry = WalEntry::new(seq, timestamp, op, path, content);
        let line = serde_json::to_string(&entry)?;
        self.writer.append_line(&line)?;
        self.checkpoint.last_seq = seq;
        Ok(seq)
    }

    /// Force a checkpoint write, persisting the current sequence and
    /// segment list outside of a rotation boundary.
    pub fn checkpoint_now(&mut self) -> Result<(), WalError> {
        self.checkpoint.last_checkpoint_ms = self.clock.epoch_ms();
        self.checkpoint.save(&self.dir)?;
        Ok(())
    }

    fn maybe_rotate(&mut self) -> Result<(), WalError> {
        let age_ms = self.clock.epoch_ms().saturating_sub(self.active_segment_opened_ms);
        let age_exceeded = Duration::from_millis(age_ms) >= self.config.max_segment_age;
        if self.writer.size() >= self.config.max_segment_size || age_exceeded {
            self.rotate()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), WalError> {
        self.checkpoint.phase = RotationPhase::CheckpointWritten;
        self.checkpoint.save(&self.dir)?;
        self.checkpoint.phase = RotationPhase::Rotating;
        self.checkpoint.save(&self.dir)?;
        self.finish_rotation()
    }

    /// Complete phase 2 of rotation: assumed `checkpoint.phase ==
    /// Rotating` already persisted. Idempotent so a crash mid-rotation can
    /// simply re-run this on the next open.
    fn finish_rotation(&mut self) -> Result<(), WalError> {
        let new_id = self.checkpoint.active_segment_id + 1;
        self.writer = SegmentWriter::open(&self.dir, new_id)?;
        if !self.checkpoint.segments.contains(&new_id) {
            self.checkpoint.segments.push(new_id);
        }
        self.checkpoint.active_segment_id = new_id;
        self.active_segment_opened_ms = self.clock.epoch_ms();
        self.prune_segments()?;
        self.checkpoint.phase = RotationPhase::None;
        self.checkpoint.save(&self.dir)?;
        Ok(())
    }

    fn prune_segments(&mut self) -> Result<(), WalError> {
        while self.checkpoint.segments.len() > self.config.retention + 1 {
            let oldest = self.checkpoint.segments.remove(0);
            segment::remove_segment(&self.dir, oldest)?;
        }
        Ok(())
    }

    /// Replay every segment in creation order, invoking `callback` for
    /// each verified entry. A checksum or parse failure truncates replay
    /// of that segment only; later segments are still replayed.
    pub fn replay(&self, mut callback: impl FnMut(&WalEntry)) -> Result<ReplayOutcome, WalError> {
        let mut replayed = 0;
        let mut errors = 0;
        for &id in &self.checkpoint.segments {
            let lines = segment::read_segment_lines(&self.dir, id)?;
            for line in lines {
                let entry: WalEntry = match serde_json::from_str(&line) {
                    Ok(entry) => entry,
                    Err(_) => {
                        warn!(segment = id, "wal segment contains an unparseable entry, truncating replay");
                        errors += 1;
                        break;
                    }
                };
                if !entry.verify() {
                    warn!(segment = id, seq = entry.seq, "wal entry failed checksum verification, truncating replay");
                    errors += 1;
                    break;
                }
                callback(&entry);
                replayed += 1;
            }
        }
        Ok(ReplayOutcome { replayed, errors })
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
