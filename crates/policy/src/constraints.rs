// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::HashSet;

/// Parameter-rewriting rules applied after a call has already cleared
/// `is_allowed` (§4.8). These never reject a call; they narrow it.
#[derive(Debug, Clone, Default)]
pub struct ConstraintConfig {
    pub force_draft_tools: HashSet<String>,
    pub allowed_labels: Option<HashSet<String>>,
    pub max_comment_length: Option<usize>,
}

impl ConstraintConfig {
    /// Rewrite `params` in place for `tool`. Must only be called after
    /// `is_allowed` has returned `allowed = true` for the same call.
    pub fn apply(&self, tool: &str, params: &mut Value) {
        if self.force_draft_tools.contains(tool) {
            if let Some(obj) = params.as_object_mut() {
                obj.insert("draft".to_string(), Value::Bool(true));
            }
        }

        if let Some(allowed) = &self.allowed_labels {
            if let Some(labels) = params.get_mut("labels").and_then(Value::as_array_mut) {
                labels.retain(|label| label.as_str().is_some_and(|l| allowed.contains(l)));
            }
        }

        if let Some(max_len) = self.max_comment_length {
            if let Some(body) = params.get_mut("body").and_then(Value::as_str).map(str::to_string) {
                if body.chars().count() > max_len {
                    let truncated: String = body.chars().take(max_len).collect();
                    if let Some(obj) = params.as_object_mut() {
                        obj.insert("body".to_string(), Value::String(truncated));
                    }
                }
            }
        }
    }
}
