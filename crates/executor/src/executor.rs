// SPDX-License-Identifier: MIT

use crate::error::ExecutorError;
use crate::types::{Capability, StepDescriptor, StepRaise, StepResult, StepRunner};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use ward_audit::{AuditTrail, IntentDescriptor};
use ward_breaker::CircuitBreaker;
use ward_core::{Clock, FailureClass, OperatingMode};
use ward_idempotency::{fingerprint, IdempotencyIndex};
use ward_limiter::{RateLimiter, TryConsumeResult};
use ward_policy::ActionPolicy;

/// Composes every safety-net subsystem around a caller-supplied
/// [`StepRunner`] (§4.9). One instance is created per boot and shared
/// across every in-flight step. Subsystems are `Arc`-shared rather than
/// owned outright so the boot orchestrator can keep its own handles for
/// health checks and idle sweeps alongside the executor.
pub struct HardenedExecutor<C: Clock> {
    mode: OperatingMode,
    policy: ActionPolicy,
    idempotency: Arc<IdempotencyIndex<C>>,
    limiter: Arc<RateLimiter<C>>,
    breaker: Arc<CircuitBreaker<C>>,
    audit: Arc<Mutex<AuditTrail<C>>>,
}

impl<C: Clock> HardenedExecutor<C> {
    pub fn new(
        mode: OperatingMode,
        policy: ActionPolicy,
        idempotency: Arc<IdempotencyIndex<C>>,
        limiter: Arc<RateLimiter<C>>,
        breaker: Arc<CircuitBreaker<C>>,
        audit: Arc<Mutex<AuditTrail<C>>>,
    ) -> Self {
        Self { mode, policy, idempotency, limiter, breaker, audit }
    }

    /// Run one workflow step under the full safety envelope (§4.9 steps 1-9).
    pub async fn execute_step(
        &self,
        workflow_id: &str,
        step: StepDescriptor,
        runner: &dyn StepRunner,
        deadline: Duration,
    ) -> Result<StepResult, ExecutorError> {
        // 1. Mode gate.
        if self.mode == OperatingMode::Degraded && step.capability == Capability::Write {
            warn!(step_id = %step.id, "degraded mode blocks write-capability step");
            return Ok(StepResult::failed("degraded_write_blocked"));
        }

        // 2. Policy gate.
        let target = format!("{}/{}", step.scope, step.resource);
        let decision = self.policy.is_allowed(&step.skill, step.event.as_deref());
        let mut params = step.parameters.clone();
        if !decision.allowed {
            let intent_seq = self.audit.lock().record_intent(IntentDescriptor {
                workflow_id: workflow_id.to_string(),
                step_id: Some(step.id.clone()),
                action: step.skill.clone(),
                target: target.clone(),
                payload: params.clone(),
            })?;
            self.audit.lock().record_result(intent_seq, json!({"status": "failed", "error": "policy_denied", "reason": decision.reason}))?;
            return Ok(StepResult::failed(format!("policy_denied: {}", decision.reason)));
        }
        self.policy.apply_constraints(&step.skill, &mut params);

        // 3. Fingerprint.
        let fingerprint = fingerprint(&step.skill, &target, &step.id);

        // 4. Dedup.
        if let Some(existing) = self.idempotency.check(&fingerprint)? {
            use ward_idempotency::IdempotencyStatus;
            match existing.status {
                IdempotencyStatus::Completed => {
                    let outputs = existing
                        .outcome_summary
                        .as_deref()
                        .and_then(|s| serde_json::from_str::<Value>(s).ok());
                    return Ok(StepResult::skipped_deduped(outputs));
                }
                IdempotencyStatus::Pending => {
                    return Ok(StepResult::failed("concurrent_in_flight"));
                }
                IdempotencyStatus::Failed => {}
            }
        }
        self.idempotency.reserve(&fingerprint)?;

        // 5. Rate limit.
        match self.limiter.try_consume(workflow_id) {
            TryConsumeResult::Allowed => {}
            TryConsumeResult::Denied { retry_after_ms, .. } => {
                self.idempotency.fail(&fingerprint, "rate_limited")?;
                return Ok(StepResult::failed("rate_limited").with_retry_after_ms(retry_after_ms));
            }
        }

        // 6. Audit intent.
        let intent_seq = self.audit.lock().record_intent(IntentDescriptor {
            workflow_id: workflow_id.to_string(),
            step_id: Some(step.id.clone()),
            action: step.skill.clone(),
            target: target.clone(),
            payload: params.clone(),
        })?;

        // 7. Circuit-protected execute.
        if self.breaker.state() == ward_breaker::CircuitState::Open {
            self.idempotency.fail(&fingerprint, "circuit_open")?;
            self.audit.lock().record_result(intent_seq, json!({"status": "failed", "error": "circuit_open"}))?;
            return Ok(StepResult::failed("circuit_open").with_class(FailureClass::Transient));
        }

        let outcome = match tokio::time::timeout(deadline, runner.run(params, deadline)).await {
            Ok(inner) => inner,
            Err(_elapsed) => Err(StepRaise::new("timeout").with_class(FailureClass::Transient)),
        };

        // 8 & 9. Audit result + dedup finalise + secondary signals.
        match outcome {
            Ok(step_outcome) => {
                info!(step_id = %step.id, "step completed");
                self.breaker.record_success();
                self.audit.lock().record_result(intent_seq, json!({"status": "completed", "outputs": step_outcome.outputs}))?;
                let summary = serde_json::to_string(&step_outcome.outputs).unwrap_or_else(|_| "null".to_string());
                self.idempotency.complete(&fingerprint, summary)?;
                if let Some(signal) = step_outcome.rate_limit_signal {
                    self.limiter.record_rate_limit(workflow_id, signal);
                }
                Ok(StepResult::completed(step_outcome.outputs))
            }
            Err(raise) => {
                let class = raise.failure_class.unwrap_or(FailureClass::Transient);
                error!(step_id = %step.id, error = %raise.message, ?class, "step failed");
                self.breaker.record_failure(class);
                self.audit.lock().record_result(
                    intent_seq,
                    json!({"status": "failed", "error": raise.message, "error_class": format!("{class:?}")}),
                )?;
                self.idempotency.fail(&fingerprint, raise.message.clone())?;
                if let Some(signal) = raise.rate_limit_signal {
                    self.limiter.record_rate_limit(workflow_id, signal);
                }
                Ok(StepResult::failed(raise.message).with_class(class))
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
