// SPDX-License-Identifier: MIT

use crate::error::BootError;
use std::path::PathBuf;
use ward_limiter::RateLimiterConfig;
use ward_policy::{ActionRule, ConstraintConfig};
use ward_redact::ExtraPattern;
use ward_store::StoreConfig;

/// The single typed configuration surface (§6 "Configuration surface").
/// Constructed via `Default` + field overrides and validated once at boot.
#[derive(Debug, Clone)]
pub struct WardConfig {
    pub data_dir: PathBuf,
    pub allow_dev: bool,
    pub audit_trail_path: Option<PathBuf>,
    pub hmac_key: Option<Vec<u8>>,
    pub mcp_tool_names: Vec<String>,
    pub action_rules: Vec<ActionRule>,
    pub constraints: ConstraintConfig,
    pub extra_redaction_patterns: Vec<ExtraPattern>,
    pub store_config: StoreConfig,
    pub limiter_config: RateLimiterConfig,
    pub breaker_config: ward_breaker::BreakerConfig,
}

impl Default for WardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./ward-data"),
            allow_dev: false,
            audit_trail_path: None,
            hmac_key: None,
            mcp_tool_names: Vec::new(),
            action_rules: Vec::new(),
            constraints: ConstraintConfig::default(),
            extra_redaction_patterns: Vec::new(),
            store_config: StoreConfig::default(),
            limiter_config: RateLimiterConfig::default(),
            breaker_config: ward_breaker::BreakerConfig::default(),
        }
    }
}

impl WardConfig {
    pub fn audit_trail_path(&self) -> PathBuf {
        self.audit_trail_path.clone().unwrap_or_else(|| self.data_dir.join("audit-trail.jsonl"))
    }

    /// Reject unknown/out-of-range values rather than silently ignoring
    /// them (§2 "Configuration").
    pub fn validate(&self) -> Result<(), BootError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(BootError::ConfigInvalid("dataDir must not be empty".to_string()));
        }
        if let Some(key) = &self.hmac_key {
            if key.is_empty() {
                return Err(BootError::ConfigInvalid("hmacKey, if provided, must not be empty".to_string()));
            }
        }
        if self.limiter_config.global_capacity <= 0.0 || self.limiter_config.workflow_capacity <= 0.0 {
            return Err(BootError::ConfigInvalid("rate limiter capacities must be positive".to_string()));
        }
        if self.breaker_config.failure_threshold == 0 {
            return Err(BootError::ConfigInvalid("circuit breaker failure threshold must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(WardConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_hmac_key_is_rejected() {
        let config = WardConfig { hmac_key: Some(Vec::new()), ..Default::default() };
        assert!(matches!(config.validate(), Err(BootError::ConfigInvalid(_))));
    }

    #[test]
    fn audit_trail_path_defaults_under_data_dir() {
        let config = WardConfig { data_dir: PathBuf::from("/tmp/ward"), ..Default::default() };
        assert_eq!(config.audit_trail_path(), PathBuf::from("/tmp/ward/audit-trail.jsonl"));
    }
}
