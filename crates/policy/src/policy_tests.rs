use super::*;
use crate::rule::ActionRule;
use serde_json::json;

#[test]
fn unmatched_tool_is_denied_by_default() {
    let policy = ActionPolicy::new(vec![], ConstraintConfig::default());
    let decision = policy.is_allowed("delete_repo", None);
    assert!(!decision.allowed);
}

#[test]
fn explicit_allow_rule_permits_the_tool() {
    let policy = ActionPolicy::new(vec![ActionRule::allow("create_issue")], ConstraintConfig::default());
    assert!(policy.is_allowed("create_issue", None).allowed);
}

#[test]
fn deny_takes_precedence_over_allow() {
    let policy = ActionPolicy::new(
        vec![ActionRule::allow("post_comment"), ActionRule::deny("post_comment")],
        ConstraintConfig::default(),
    );
    assert!(!policy.is_allowed("post_comment", None).allowed);
}

#[test]
fn event_scoped_denial_overrides_a_general_allow() {
    let policy = ActionPolicy::new(
        vec![
            ActionRule::allow("post_comment"),
            ActionRule::deny("post_comment").for_event("webhook.untrusted"),
        ],
        ConstraintConfig::default(),
    );
    assert!(policy.is_allowed("post_comment", Some("webhook.trusted")).allowed);
    assert!(!policy.is_allowed("post_comment", Some("webhook.untrusted")).allowed);
}

#[test]
fn validate_registry_flags_unregistered_tools() {
    let policy = ActionPolicy::new(vec![ActionRule::allow("create_issue")], ConstraintConfig::default());
    let registered: HashSet<String> = ["post_comment".to_string()].into();
    let result = policy.validate_registry(&registered);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn validate_registry_passes_when_every_referenced_tool_exists() {
    let policy = ActionPolicy::new(vec![ActionRule::allow("create_issue")], ConstraintConfig::default());
    let registered: HashSet<String> = ["create_issue".to_string()].into();
    let result = policy.validate_registry(&registered);
    assert!(result.valid);
    assert!(result.errors.is_empty());
}

#[test]
fn apply_constraints_delegates_to_constraint_config() {
    let constraints = ConstraintConfig { force_draft_tools: ["create_pr".to_string()].into(), ..Default::default() };
    let policy = ActionPolicy::new(vec![ActionRule::allow("create_pr")], constraints);
    let mut params = json!({});
    policy.apply_constraints("create_pr", &mut params);
    assert_eq!(params["draft"], json!(true));
}
