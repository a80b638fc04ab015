// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyStatus {
    Pending,
    Completed,
    Failed,
}

/// One fingerprint's dedup record (§4.7). Fingerprints never change once
/// recorded; status only ever transitions pending -> completed or
/// pending -> failed, though a failed fingerprint may be reserved again
/// (bumping `attempt_count`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdempotencyRecord {
    pub status: IdempotencyStatus,
    pub created_at_ms: u64,
    pub completed_at_ms: Option<u64>,
    pub outcome_summary: Option<String>,
    pub attempt_count: u32,
}

impl IdempotencyRecord {
    pub fn pending(now_ms: u64, attempt_count: u32) -> Self {
        Self { status: IdempotencyStatus::Pending, created_at_ms: now_ms, completed_at_ms: None, outcome_summary: None, attempt_count }
    }
}

/// Compose the deterministic, canonical fingerprint for a step invocation
/// (§4.7, §4.9 step 3): `action:scope/resource:stepId`.
pub fn fingerprint(action: &str, target: &str, step_id: &str) -> String {
    format!("{action}:{target}:{step_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic_and_delimited() {
        assert_eq!(fingerprint("create_issue", "org/repo", "st-1"), "create_issue:org/repo:st-1");
    }
}
