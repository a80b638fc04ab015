// SPDX-License-Identifier: MIT

use crate::bucket::Bucket;
use crate::error::LimiterError;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use ward_core::Clock;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub global_capacity: f64,
    pub global_refill_per_hour: f64,
    pub workflow_capacity: f64,
    pub workflow_refill_per_hour: f64,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub idle_threshold: Duration,
    pub sweep_interval: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            global_capacity: 500.0,
            global_refill_per_hour: 500.0,
            workflow_capacity: 60.0,
            workflow_refill_per_hour: 60.0,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 300_000,
            idle_threshold: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl RateLimiterConfig {
    fn validate(&self) -> Result<(), LimiterError> {
        if self.global_capacity <= 0.0 || self.workflow_capacity <= 0.0 {
            return Err(LimiterError::InvalidConfig("bucket capacities must be positive".into()));
        }
        if self.global_refill_per_hour < 0.0 || self.workflow_refill_per_hour < 0.0 {
            return Err(LimiterError::InvalidConfig("refill rates cannot be negative".into()));
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(LimiterError::InvalidConfig("backoff cap must be >= backoff base".into()));
        }
        Ok(())
    }

    fn global_refill_per_ms(&self) -> f64 {
        self.global_refill_per_hour / 3_600_000.0
    }

    fn workflow_refill_per_ms(&self) -> f64 {
        self.workflow_refill_per_hour / 3_600_000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Global,
    Workflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitSignal {
    Primary,
    Secondary { retry_after_seconds: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TryConsumeResult {
    Allowed,
    Denied { retry_after_ms: u64, bucket: BucketKind },
}

struct WorkflowState {
    bucket: Bucket,
    hold_off_until_ms: Option<u64>,
    attempts: u32,
    last_access_ms: u64,
}

/// Dual-bucket rate limiter: one shared global bucket, one per-workflow
/// bucket created on first use (§4.5).
pub struct RateLimiter<C: Clock> {
    clock: C,
    config: RateLimiterConfig,
    global: Mutex<Bucket>,
    workflows: Mutex<HashMap<String, WorkflowState>>,
}

impl<C: Clock> RateLimiter<C> {
    pub fn new(config: RateLimiterConfig, clock: C) -> Result<Self, LimiterError> {
        config.validate()?;
        let now = clock.epoch_ms();
        let global = Bucket::full(config.global_capacity, config.global_refill_per_ms(), now);
        Ok(Self { clock, config, global: Mutex::new(global), workflows: Mutex::new(HashMap::new()) })
    }

    pub fn try_consume(&self, workflow_id: &str) -> TryConsumeResult {
        let now = self.clock.epoch_ms();
        let mut global = self.global.lock();
        global.refill(now);

        let mut workflows = self.workflows.lock();
        let entry = workflows.entry(workflow_id.to_string()).or_insert_with(|| WorkflowState {
            bucket: Bucket::full(self.config.workflow_capacity, self.config.workflow_refill_per_ms(), now),
            hold_off_until_ms: None,
            attempts: 0,
            last_access_ms: now,
        });
        entry.bucket.refill(now);
        entry.last_access_ms = now;

        if let Some(hold_off) = entry.hold_off_until_ms.take() {
            return TryConsumeResult::Denied { retry_after_ms: hold_off.saturating_sub(now), bucket: BucketKind::Workflow };
        }

        if global.tokens() < 1.0 {
            return TryConsumeResult::Denied { retry_after_ms: global.time_until_one_token_ms(), bucket: BucketKind::Global };
        }

        if entry.bucket.tokens() < 1.0 {
            return TryConsumeResult::Denied { retry_after_ms: entry.bucket.time_until_one_token_ms(), bucket: BucketKind::Workflow };
        }

        global.consume_one();
        entry.bucket.consume_one();
        entry.attempts = 0;
        TryConsumeResult::Allowed
    }

    pub fn record_rate_limit(&self, workflow_id: &str, signal: RateLimitSignal) {
        let now = self.clock.epoch_ms();
        if matches!(signal, RateLimitSignal::Primary) {
            self.global.lock().drain();
        }

        let mut workflows = self.workflows.lock();
        let entry = workflows.entry(workflow_id.to_string()).or_insert_with(|| WorkflowState {
            bucket: Bucket::full(self.config.workflow_capacity, self.config.workflow_refill_per_ms(), now),
            hold_off_until_ms: None,
            attempts: 0,
            last_access_ms: now,
        });
        if let RateLimitSignal::Secondary { retry_after_seconds } = signal {
            entry.hold_off_until_ms = Some(now + retry_after_seconds * 1000);
            entry.bucket.drain();
        }
        entry.attempts += 1;
        entry.last_access_ms = now;
    }

    pub fn get_backoff_ms(&self, workflow_id: &str) -> u64 {
        let now = self.clock.epoch_ms();
        let workflows = self.workflows.lock();
        let Some(entry) = workflows.get(workflow_id) else { return 0 };
        if entry.attempts == 0 {
            return 0;
        }
        let raw = (self.config.backoff_base_ms as f64 * 2f64.powi(entry.attempts as i32)).min(self.config.backoff_cap_ms as f64);
        let jitter = rand::thread_rng().gen_range(0.75..1.25);
        let value = (raw * jitter) as u64;
        match entry.hold_off_until_ms {
            Some(hold_off) => value.max(hold_off.saturating_sub(now)),
            None => value,
        }
    }

    /// Evict per-workflow records idle longer than the configured
    /// threshold. Returns the number evicted.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.epoch_ms();
        let threshold_ms = self.config.idle_threshold.as_millis() as u64;
        let mut workflows = self.workflows.lock();
        let before = workflows.len();
        workflows.retain(|_, state| now.saturating_sub(state.last_access_ms) <= threshold_ms);
        before - workflows.len()
    }

    /// No background sweep task runs inside this limiter; the boot
    /// orchestrator drives `cleanup()` on its own interval. `shutdown` is
    /// provided so callers have a symmetric stop signal to invoke.
    pub fn shutdown(&self) {}
}

#[cfg(test)]
#[path = "limiter_tests.rs"]
mod tests;
