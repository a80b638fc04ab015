// SPDX-License-Identifier: MIT

//! The hash-chained record format: each record's checksum covers its own
//! fields (minus the checksum itself) plus a back-reference to the
//! previous record's checksum, so a linear scan can detect any tamper.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ward_core::{canonical_json, checksum_hex, hmac_hex};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditPhase {
    Intent,
    Result,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub seq: u64,
    pub timestamp: String,
    pub phase: AuditPhase,
    pub workflow_id: String,
    pub step_id: Option<String>,
    pub action: String,
    pub target: String,
    pub payload: Value,
    /// Set only on `Result` records: the sequence of the intent it closes.
    pub intent_seq: Option<u64>,
    pub prev_checksum: Option<String>,
    pub checksum: String,
    pub hmac: Option<String>,
}

#[allow(clippy::too_many_arguments)]
impl AuditRecord {
    pub(crate) fn new(
        seq: u64,
        timestamp: String,
        phase: AuditPhase,
        workflow_id: String,
        step_id: Option<String>,
        action: String,
        target: String,
        payload: Value,
        intent_seq: Option<u64>,
        prev_checksum: Option<String>,
        hmac_key: Option<&[u8]>,
    ) -> Self {
        let mut record = Self {
            seq,
            timestamp,
            phase,
            workflow_id,
            step_id,
            action,
            target,
            payload,
            intent_seq,
            prev_checksum,
            checksum: String::new(),
            hmac: None,
        };
        record.checksum = record.compute_checksum();
        if let Some(key) = hmac_key {
            record.hmac = Some(record.compute_hmac(key));
        }
        record
    }

    fn compute_checksum(&self) -> String {
        let mut unchecksummed = self.clone();
        unchecksummed.checksum = String::new();
        unchecksummed.hmac = None;
        let canon = canonical_json(&unchecksummed).unwrap_or_default();
        checksum_hex(canon.as_bytes())
    }

    fn compute_hmac(&self, key: &[u8]) -> String {
        let mut unhmaced = self.clone();
        unhmaced.hmac = None;
        let canon = canonical_json(&unhmaced).unwrap_or_default();
        hmac_hex(key, canon.as_bytes())
    }

    /// Re-derive the checksum (and HMAC, if one is present) and compare.
    pub fn verify(&self, hmac_key: Option<&[u8]>) -> bool {
        if self.checksum != self.compute_checksum() {
            return false;
        }
        match (hmac_key, &self.hmac) {
            (Some(key), Some(hmac)) => *hmac == self.compute_hmac(key),
            (None, None) => true,
            // A keyed record read back without the key (or vice versa)
            // cannot be verified either way.
            _ => false,
        }
    }
}
