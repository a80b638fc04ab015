// SPDX-License-Identifier: MIT

//! On-demand health reporting (§4.1, §6). Every subsystem's status is
//! re-evaluated at call time, never cached from boot.

use std::collections::BTreeMap;
use ward_core::SubsystemStatus;

/// Snapshot of subsystem health taken at the moment of the call. Overall
/// status is the worst status among P0 subsystems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub overall: SubsystemStatus,
    pub subsystems: BTreeMap<String, SubsystemStatus>,
}

impl HealthReport {
    pub(crate) fn build(entries: Vec<(&'static str, bool, SubsystemStatus)>) -> Self {
        let mut subsystems = BTreeMap::new();
        let mut overall = SubsystemStatus::Ok;
        for (name, is_p0, status) in entries {
            if is_p0 {
                overall = overall.worst(status);
            }
            subsystems.insert(name.to_string(), status);
        }
        Self { overall, subsystems }
    }
}
