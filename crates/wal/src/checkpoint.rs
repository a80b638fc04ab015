// SPDX-License-Identifier: MIT

//! The WAL's global state record: last sequence, active segment, known
//! segments, and an in-progress rotation phase that lets a restarting
//! writer resume an interrupted rotation instead of re-deriving it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RotationPhase {
    None,
    CheckpointWritten,
    Rotating,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub last_seq: u64,
    pub active_segment_id: u64,
    pub segments: Vec<u64>,
    pub last_checkpoint_ms: u64,
    pub phase: RotationPhase,
}

impl Checkpoint {
    pub fn fresh(segment_id: u64, now_ms: u64) -> Self {
        Self { last_seq: 0, active_segment_id: segment_id, segments: vec![segment_id], last_checkpoint_ms: now_ms, phase: RotationPhase::None }
    }

    pub fn path(dir: &Path) -> PathBuf {
        dir.join("checkpoint.json")
    }

    pub fn load(dir: &Path) -> io::Result<Option<Self>> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        match serde_json::from_slice(&bytes) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(_) => Ok(None),
        }
    }

    /// Atomically persist this checkpoint: write to a temp file, fsync,
    /// then rename over the previous checkpoint.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        let path = Self::path(dir);
        let tmp_path = dir.join("checkpoint.json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            use std::io::Write;
            let bytes = serde_json::to_vec(self)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        if let Ok(dir_handle) = fs::File::open(dir) {
            let _ = dir_handle.sync_all();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_checkpoint_starts_at_zero() {
        let checkpoint = Checkpoint::fresh(1, 1000);
        assert_eq!(checkpoint.last_seq, 0);
        assert_eq!(checkpoint.segments, vec![1]);
        assert_eq!(checkpoint.phase, RotationPhase::None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint { last_seq: 5, active_segment_id: 2, segments: vec![1, 2], last_checkpoint_ms: 42, phase: RotationPhase::CheckpointWritten };
        checkpoint.save(dir.path()).unwrap();
        let loaded = Checkpoint::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn load_on_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Checkpoint::load(dir.path()).unwrap(), None);
    }
}
