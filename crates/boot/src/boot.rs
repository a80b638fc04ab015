// SPDX-License-Identifier: MIT

use crate::config::WardConfig;
use crate::error::BootError;
use crate::health::HealthReport;
use crate::lock::ProcessLock;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use ward_audit::AuditTrail;
use ward_breaker::CircuitBreaker;
use ward_core::{Clock, OperatingMode, SubsystemStatus};
use ward_executor::HardenedExecutor;
use ward_idempotency::{IdempotencyIndex, IdempotencyRecord};
use ward_limiter::RateLimiter;
use ward_policy::ActionPolicy;
use ward_redact::Redactor;
use ward_store::{MigrationRegistry, StoreFactory};

/// Live service bundle handed back from a successful boot. Every subsystem
/// the executor also needs is `Arc`-shared so the orchestrator can run
/// health checks and idle sweeps against the very instances in use.
pub struct Services<C: Clock> {
    pub redactor: Arc<Redactor>,
    pub store_factory: StoreFactory<C>,
    pub audit: Arc<Mutex<AuditTrail<C>>>,
    pub limiter: Arc<RateLimiter<C>>,
    pub breaker: Arc<CircuitBreaker<C>>,
    pub idempotency: Arc<IdempotencyIndex<C>>,
    pub policy: Arc<ActionPolicy>,
    pub executor: Arc<HardenedExecutor<C>>,
    lock: Option<ProcessLock>,
    sweep_handle: Option<tokio::task::JoinHandle<()>>,
}

impl<C: Clock> Services<C> {
    /// Re-evaluate every subsystem's health on demand (§4.1, §6). Never
    /// cached: a call an hour after boot reflects current condition, not
    /// the boot-time snapshot.
    pub fn health_report(&self) -> HealthReport {
        let audit_ok = self.audit.lock().verify_chain().map(|v| v.valid).unwrap_or(false);
        let store_dir_ok = self.store_factory.data_dir().exists();
        HealthReport::build(vec![
            ("redactor", true, SubsystemStatus::Ok),
            ("audit_trail", true, if audit_ok { SubsystemStatus::Ok } else { SubsystemStatus::Failed }),
            ("lock_manager", true, if self.lock.is_some() { SubsystemStatus::Ok } else { SubsystemStatus::Failed }),
            ("store_factory", false, if store_dir_ok { SubsystemStatus::Ok } else { SubsystemStatus::Degraded }),
            ("circuit_breaker", false, SubsystemStatus::Ok),
            ("rate_limiter", false, SubsystemStatus::Ok),
            ("idempotency_index", false, SubsystemStatus::Ok),
        ])
    }

    /// Release resources in reverse boot order (§4.1): stop the rate
    /// limiter's idle sweep, flush + fsync the audit trail, release the
    /// data-directory lock.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.sweep_handle.take() {
            handle.abort();
        }
        self.limiter.shutdown();
        if let Err(err) = self.audit.lock().flush() {
            warn!(%err, "audit trail flush failed during shutdown");
        }
        self.lock.take();
    }
}

pub struct BootResult<C: Clock> {
    pub success: bool,
    pub mode: OperatingMode,
    pub boot_time_ms: u64,
    pub warnings: Vec<String>,
    pub subsystems: BTreeMap<String, SubsystemStatus>,
    pub services: Services<C>,
}

/// Builds the full service graph deterministically and decides the
/// operating mode (§4.1). The only phase allowed to abort the process.
pub struct BootOrchestrator;

impl BootOrchestrator {
    pub async fn boot<C: Clock + 'static>(config: WardConfig, clock: C) -> Result<BootResult<C>, BootError> {
        let started = clock.epoch_ms();
        let mut subsystems: BTreeMap<String, SubsystemStatus> = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut p0_failures: Vec<String> = Vec::new();
        let mut p1_failed = false;

        // 1. Validate configuration.
        config.validate()?;

        // 2. Verify data directory is accessible.
        if let Err(err) = std::fs::create_dir_all(&config.data_dir) {
            return Err(BootError::DataDirInaccessible(err.to_string()));
        }

        // 3. Build Redactor -> Logger -> Audit Trail -> Store Factory ->
        // Circuit Breaker -> Rate Limiter -> Idempotency Index -> Tool
        // Validator -> Lock Manager, in that fixed order.
        let redactor = Arc::new(Redactor::new(&config.extra_redaction_patterns)?);
        subsystems.insert("redactor".to_string(), SubsystemStatus::Ok);
        subsystems.insert("logger".to_string(), SubsystemStatus::Ok);

        let audit_redactor = match Redactor::new(&config.extra_redaction_patterns) {
            Ok(r) => r,
            Err(err) => {
                p0_failures.push(format!("redactor: {err}"));
                Redactor::new(&[]).map_err(BootError::Redact)?
            }
        };
        let audit = match AuditTrail::open(config.audit_trail_path(), clock.clone(), audit_redactor, config.hmac_key.clone()) {
            Ok(trail) => {
                subsystems.insert("audit_trail".to_string(), SubsystemStatus::Ok);
                trail
            }
            Err(err) => {
                p0_failures.push(format!("audit_trail: {err}"));
                subsystems.insert("audit_trail".to_string(), SubsystemStatus::Failed);
                if !config.allow_dev {
                    return Self::abort(started, clock, p0_failures);
                }
                let fallback_path = config.data_dir.join("dev-fallback-audit-trail.jsonl");
                let fallback_redactor = Redactor::new(&[]).map_err(BootError::Redact)?;
                AuditTrail::open(fallback_path, clock.clone(), fallback_redactor, None)
                    .map_err(|e| BootError::CriticalFailure(vec![e.to_string()]))?
            }
        };
        let audit = Arc::new(Mutex::new(audit));

        let store_factory = StoreFactory::new(config.data_dir.clone(), clock.clone());
        subsystems.insert("store_factory".to_string(), SubsystemStatus::Ok);

        let breaker = Arc::new(CircuitBreaker::new(config.breaker_config.clone(), clock.clone()));
        subsystems.insert("circuit_breaker".to_string(), SubsystemStatus::Ok);

        let limiter = match RateLimiter::new(config.limiter_config.clone(), clock.clone()) {
            Ok(limiter) => {
                subsystems.insert("rate_limiter".to_string(), SubsystemStatus::Ok);
                limiter
            }
            Err(err) => {
                warnings.push(format!("rate_limiter degraded: {err}"));
                subsystems.insert("rate_limiter".to_string(), SubsystemStatus::Failed);
                p1_failed = true;
                RateLimiter::new(ward_limiter::RateLimiterConfig::default(), clock.clone())
                    .map_err(|e| BootError::CriticalFailure(vec![e.to_string()]))?
            }
        };
        let limiter = Arc::new(limiter);

        let idem_store = store_factory.open::<std::collections::HashMap<String, IdempotencyRecord>>(
            "idempotency",
            config.store_config.clone(),
            MigrationRegistry::new(),
        );
        let idempotency = Arc::new(IdempotencyIndex::new(idem_store, clock.clone()));
        subsystems.insert("idempotency_index".to_string(), SubsystemStatus::Ok);

        let policy = ActionPolicy::new(config.action_rules.clone(), config.constraints.clone());
        if config.mcp_tool_names.is_empty() {
            subsystems.insert("tool_validator".to_string(), SubsystemStatus::Ok);
        } else {
            let registered: HashSet<String> = config.mcp_tool_names.iter().cloned().collect();
            let validation = policy.validate_registry(&registered);
            if validation.valid {
                warnings.extend(validation.warnings);
                subsystems.insert("tool_validator".to_string(), SubsystemStatus::Ok);
            } else {
                p0_failures.extend(validation.errors.clone());
                subsystems.insert("tool_validator".to_string(), SubsystemStatus::Failed);
                if !config.allow_dev {
                    return Self::abort(started, clock, p0_failures);
                }
                warnings.extend(validation.errors);
            }
        }

        let lock = match ProcessLock::acquire(&config.data_dir) {
            Ok(lock) => {
                subsystems.insert("lock_manager".to_string(), SubsystemStatus::Ok);
                Some(lock)
            }
            Err(err) => {
                p0_failures.push(err.to_string());
                subsystems.insert("lock_manager".to_string(), SubsystemStatus::Failed);
                if !config.allow_dev {
                    return Self::abort(started, clock, p0_failures);
                }
                warnings.push(err.to_string());
                None
            }
        };

        // 4. Reconcile pending intents.
        let pending = audit.lock().pending_intents();
        if !pending.is_empty() {
            warnings.push(format!("{} audit intent(s) have no matching result from a prior crash", pending.len()));
        }

        // 5. Stale locks: `ProcessLock::acquire` itself recovers a stale
        // flock left by a dead process (the OS releases it on exit), so no
        // further reconciliation step is needed here.

        let mode = if !p0_failures.is_empty() {
            warn!(?p0_failures, "P0 failure(s) suppressed under allow_dev; unsafe for production");
            OperatingMode::Dev
        } else if p1_failed {
            OperatingMode::Degraded
        } else {
            OperatingMode::Autonomous
        };

        let executor = Arc::new(HardenedExecutor::new(
            mode,
            policy.clone(),
            idempotency.clone(),
            limiter.clone(),
            breaker.clone(),
            audit.clone(),
        ));

        let sweep_handle = Self::spawn_sweep(limiter.clone(), config.limiter_config.sweep_interval);

        let services = Services {
            redactor,
            store_factory,
            audit,
            limiter,
            breaker,
            idempotency,
            policy: Arc::new(policy),
            executor,
            lock,
            sweep_handle: Some(sweep_handle),
        };

        info!(?mode, warnings = warnings.len(), "boot complete");
        Ok(BootResult {
            success: true,
            mode,
            boot_time_ms: clock.epoch_ms().saturating_sub(started),
            warnings,
            subsystems,
            services,
        })
    }

    fn spawn_sweep<C: Clock + 'static>(limiter: Arc<RateLimiter<C>>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = limiter.cleanup();
                if evicted > 0 {
                    info!(evicted, "rate limiter idle sweep");
                }
            }
        })
    }

    fn abort<C: Clock>(started: u64, clock: C, p0_failures: Vec<String>) -> Result<BootResult<C>, BootError> {
        let _ = clock.epoch_ms().saturating_sub(started);
        Err(BootError::CriticalFailure(p0_failures))
    }
}

#[cfg(test)]
#[path = "boot_tests.rs"]
mod tests;
