// SPDX-License-Identifier: MIT

//! Sum types shared across subsystem boundaries. Kept here rather than
//! stringly-typed so every consumer matches exhaustively.

use serde::{Deserialize, Serialize};

/// Global admission posture computed once at boot (§4.1) and held for the
/// process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// All P0 and P1 subsystems are healthy.
    Autonomous,
    /// A P1 (degradable) subsystem failed; write-capability steps are blocked.
    Degraded,
    /// A P0 (critical) subsystem failed but dev mode was explicitly allowed.
    /// Unsafe for production use.
    Dev,
}

impl OperatingMode {
    /// Whether a step of the given capability may be admitted in this mode.
    pub fn allows_write(self) -> bool {
        !matches!(self, OperatingMode::Degraded)
    }
}

/// Per-subsystem health, as reported at boot and on demand via the health
/// check interface (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemStatus {
    Ok,
    Degraded,
    Failed,
}

impl SubsystemStatus {
    /// Combine two statuses, keeping the worse of the two.
    pub fn worst(self, other: SubsystemStatus) -> SubsystemStatus {
        use SubsystemStatus::*;
        match (self, other) {
            (Failed, _) | (_, Failed) => Failed,
            (Degraded, _) | (_, Degraded) => Degraded,
            (Ok, Ok) => Ok,
        }
    }
}

/// Classification of a raised failure, used by the circuit breaker to
/// decide whether it counts toward the failure threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Likely to succeed on retry (server error, timeout).
    Transient,
    /// A resource that was not expected to exist was missing — not a fault.
    Expected,
    /// Input was rejected and retrying with the same input will not help.
    Permanent,
    /// A failure in network/transport plumbing rather than the remote service.
    External,
    /// The remote service signalled a rate limit.
    RateLimited,
}

impl FailureClass {
    /// Whether this class counts toward the circuit breaker's rolling window
    /// by default. `Expected` and `Permanent` failures are not transient
    /// service degradation and must not trip the breaker.
    pub fn countable_by_default(self) -> bool {
        matches!(self, FailureClass::Transient | FailureClass::External | FailureClass::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_prefers_failed_over_degraded_over_ok() {
        assert_eq!(SubsystemStatus::Ok.worst(SubsystemStatus::Degraded), SubsystemStatus::Degraded);
        assert_eq!(SubsystemStatus::Degraded.worst(SubsystemStatus::Failed), SubsystemStatus::Failed);
        assert_eq!(SubsystemStatus::Ok.worst(SubsystemStatus::Ok), SubsystemStatus::Ok);
    }

    #[test]
    fn degraded_mode_blocks_writes_only() {
        assert!(!OperatingMode::Degraded.allows_write());
        assert!(OperatingMode::Autonomous.allows_write());
        assert!(OperatingMode::Dev.allows_write());
    }

    #[test]
    fn default_countable_classes_match_spec() {
        assert!(FailureClass::Transient.countable_by_default());
        assert!(FailureClass::External.countable_by_default());
        assert!(FailureClass::RateLimited.countable_by_default());
        assert!(!FailureClass::Expected.countable_by_default());
        assert!(!FailureClass::Permanent.countable_by_default());
    }
}
