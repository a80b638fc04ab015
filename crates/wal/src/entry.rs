// SPDX-License-Identifier: MIT

//! WAL entries: one newline-delimited JSON record per logged operation,
//! self-checksummed so replay can detect a torn write.

use serde::{Deserialize, Serialize};
use ward_core::{canonical_json, checksum_hex};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalOp {
    Write,
    Delete,
    Mkdir,
}

/// One logged operation: sequence, timestamp, operation, target path, and
/// an optional content payload with its own checksum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalEntry {
    pub seq: u64,
    pub timestamp: String,
    pub op: WalOp,
    pub path: String,
    pub content_checksum: Option<String>,
    pub content: Option<String>,
    pub checksum: String,
}

impl WalEntry {
    pub(crate) fn new(seq: u64, timestamp: String, op: WalOp, path: String, content: Option<String>) -> Self {
        let content_checksum = content.as_ref().map(|c| checksum_hex(c.as_bytes()));
        let mut entry = Self { seq, timestamp, op, path, content_checksum, content, checksum: String::new() };
        entry.checksum = entry.compute_checksum();
        entry
    }

    fn compute_checksum(&self) -> String {
        let mut unchecksummed = self.clone();
        unchecksummed.checksum = String::new();
        let canon = canonical_json(&unchecksummed).unwrap_or_default();
        checksum_hex(canon.as_bytes())
    }

    /// Re-derive the checksum and compare against the stored one.
    pub fn verify(&self) -> bool {
        self.compute_checksum() == self.checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_has_self_consistent_checksum() {
        let entry = WalEntry::new(1, "2026-01-01T00:00:00Z".into(), WalOp::Write, "a.txt".into(), Some("hi".into()));
        assert!(entry.verify());
    }

    #[test]
    fn tampering_with_path_breaks_verification() {
        let mut entry = WalEntry::new(1, "2026-01-01T00:00:00Z".into(), WalOp::Write, "a.txt".into(), None);
        entry.path = "b.txt".into();
        assert!(!entry.verify());
    }

    #[test]
    fn content_checksum_tracks_content() {
        let entry = WalEntry::new(1, "2026-01-01T00:00:00Z".into(), WalOp::Write, "a.txt".into(), Some("hi".into()));
        assert_eq!(entry.content_checksum, Some(checksum_hex(b"hi")));
    }
}
