// SPDX-License-Identifier: MIT

use crate::constraints::ConstraintConfig;
use crate::rule::{ActionRule, Effect};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: String,
}

impl Decision {
    fn allow(reason: impl Into<String>) -> Self {
        Self { allowed: true, reason: reason.into() }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self { allowed: false, reason: reason.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Allow/deny-list plus constraint enforcement for each step invocation
/// (§4.8). Deny rules always take precedence over allow rules; an
/// unmatched tool is denied by default.
#[derive(Debug, Clone, Default)]
pub struct ActionPolicy {
    rules: Vec<ActionRule>,
    constraints: ConstraintConfig,
}

impl ActionPolicy {
    pub fn new(rules: Vec<ActionRule>, constraints: ConstraintConfig) -> Self {
        Self { rules, constraints }
    }

    /// Verify every tool referenced by a rule is present in `registered`.
    /// Does not inspect `_params`; reserved for future per-tool schema checks.
    pub fn validate_registry(&self, registered: &HashSet<String>) -> RegistryValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for rule in &self.rules {
            if rule.tool == "*" {
                continue;
            }
            if !registered.contains(&rule.tool) {
                errors.push(format!("policy references unregistered tool '{}'", rule.tool));
            }
        }
        if registered.is_empty() {
            warnings.push("no tools registered; every call will be denied".to_string());
        }
        RegistryValidation { valid: errors.is_empty(), errors, warnings }
    }

    /// Decide whether `tool` may run, optionally scoped to `event`.
    /// `_params` is accepted for forward compatibility with param-shaped
    /// constraints but is not yet consulted.
    pub fn is_allowed(&self, tool: &str, event: Option<&str>) -> Decision {
        for rule in &self.rules {
            if rule.effect == Effect::Deny && rule.matches(tool, event) {
                let decision = Decision::deny(format!("tool '{tool}' is denied by policy"));
                debug!(tool, event, reason = %decision.reason, "policy decision");
                return decision;
            }
        }
        for rule in &self.rules {
            if rule.effect == Effect::Allow && rule.matches(tool, event) {
                let decision = Decision::allow(format!("tool '{tool}' is explicitly allowed"));
                debug!(tool, event, reason = %decision.reason, "policy decision");
                return decision;
            }
        }
        let decision = Decision::deny(format!("tool '{tool}' matches no allow rule"));
        debug!(tool, event, reason = %decision.reason, "policy decision");
        decision
    }

    /// Rewrite `params` in place. Callers must only invoke this after
    /// `is_allowed` returned `allowed = true` for the same call.
    pub fn apply_constraints(&self, tool: &str, params: &mut Value) {
        self.constraints.apply(tool, params);
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
