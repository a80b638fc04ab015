// SPDX-License-Identifier: MIT

//! The fixed pattern set plus operator-supplied extra patterns.

use regex::Regex;

/// A named pattern supplied by configuration (`extraRedactionPatterns`).
#[derive(Debug, Clone)]
pub struct ExtraPattern {
    pub name: String,
    pub regex: String,
}

pub(crate) struct Pattern {
    pub(crate) name: String,
    pub(crate) regex: Regex,
}

/// Sensitive key names whose *value* is always redacted when encountered
/// as an object key during structural redaction, or as the left side of a
/// `key=value` / `key: value` pair in free text — regardless of whether
/// the value itself looks secret-shaped.
pub(crate) const SENSITIVE_KEY_NAMES: &[&str] = &[
    "password",
    "passwd",
    "token",
    "access_token",
    "refresh_token",
    "secret",
    "client_secret",
    "api_key",
    "apikey",
    "authorization",
    "auth",
    "private_key",
    "aws_secret_access_key",
];

/// HTTP header names stripped outright regardless of value shape.
pub(crate) const SENSITIVE_HEADER_NAMES: &[&str] =
    &["authorization", "cookie", "set-cookie", "x-api-key", "proxy-authorization"];

pub(crate) fn builtin_patterns() -> Result<Vec<Pattern>, regex::Error> {
    Ok(vec![
        Pattern { name: "github_pat".to_string(), regex: Regex::new(r"ghp_[A-Za-z0-9]{36}")? },
        Pattern { name: "github_oauth".to_string(), regex: Regex::new(r"gho_[A-Za-z0-9]{36}")? },
        Pattern {
            name: "github_app_token".to_string(),
            regex: Regex::new(r"gh[usr]_[A-Za-z0-9]{36,255}")?,
        },
        Pattern { name: "aws_access_key".to_string(), regex: Regex::new(r"AKIA[0-9A-Z]{16}")? },
        Pattern {
            name: "generic_secret_pair".to_string(),
            regex: Regex::new(&format!(
                r#"(?i)\b({})\b\s*[:=]\s*"?([^\s"',}}]{{3,}})"?"#,
                SENSITIVE_KEY_NAMES.join("|")
            ))?,
        },
    ])
}

pub(crate) fn compile_extra(extra: &[ExtraPattern]) -> Result<Vec<Pattern>, regex::Error> {
    extra.iter().map(|p| Ok(Pattern { name: p.name.clone(), regex: Regex::new(&p.regex)? })).collect()
}
