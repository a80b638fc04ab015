// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    Deny,
}

/// One allow/deny entry. `tool` is matched literally or against `*` (any
/// tool). `event`, when present, scopes the rule to a specific triggering
/// event (e.g. a webhook kind); `None` matches every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRule {
    pub tool: String,
    pub event: Option<String>,
    pub effect: Effect,
}

impl ActionRule {
    pub fn allow(tool: impl Into<String>) -> Self {
        Self { tool: tool.into(), event: None, effect: Effect::Allow }
    }

    pub fn deny(tool: impl Into<String>) -> Self {
        Self { tool: tool.into(), event: None, effect: Effect::Deny }
    }

    pub fn for_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub(crate) fn matches(&self, tool: &str, event: Option<&str>) -> bool {
        let tool_matches = self.tool == "*" || self.tool == tool;
        let event_matches = match &self.event {
            None => true,
            Some(rule_event) => event == Some(rule_event.as_str()),
        };
        tool_matches && event_matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_tool_matches_any_name() {
        let rule = ActionRule::deny("*");
        assert!(rule.matches("create_issue", None));
    }

    #[test]
    fn event_scoped_rule_only_matches_that_event() {
        let rule = ActionRule::deny("post_comment").for_event("webhook.untrusted");
        assert!(rule.matches("post_comment", Some("webhook.untrusted")));
        assert!(!rule.matches("post_comment", Some("webhook.trusted")));
        assert!(!rule.matches("post_comment", None));
    }
}
