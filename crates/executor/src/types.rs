// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use ward_core::FailureClass;
use ward_limiter::RateLimitSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

/// One workflow step handed to the executor (§4.9 "Step descriptor").
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub id: String,
    pub skill: String,
    pub scope: String,
    pub resource: String,
    pub capability: Capability,
    pub parameters: Value,
    /// The triggering event this step was raised for, if any (e.g. a
    /// webhook kind). Lets the policy gate honour event-scoped rules.
    pub event: Option<String>,
}

/// What a [`StepRunner`] hands back on success.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub outputs: Value,
    pub rate_limit_signal: Option<RateLimitSignal>,
}

impl StepOutcome {
    pub fn new(outputs: Value) -> Self {
        Self { outputs, rate_limit_signal: None }
    }
}

/// What a [`StepRunner`] raises on failure.
#[derive(Debug, Clone)]
pub struct StepRaise {
    pub message: String,
    pub failure_class: Option<FailureClass>,
    pub rate_limit_signal: Option<RateLimitSignal>,
}

impl StepRaise {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), failure_class: None, rate_limit_signal: None }
    }

    pub fn with_class(mut self, class: FailureClass) -> Self {
        self.failure_class = Some(class);
        self
    }

    pub fn with_signal(mut self, signal: RateLimitSignal) -> Self {
        self.rate_limit_signal = Some(signal);
        self
    }
}

/// The caller-supplied execution function, expressed as a named capability
/// trait rather than a closure (§4.9).
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn run(&self, params: Value, deadline: Duration) -> Result<StepOutcome, StepRaise>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Skipped,
    Failed,
}

/// Result handed back to the caller of [`crate::HardenedExecutor::execute_step`].
#[derive(Debug, Clone)]
pub struct StepResult {
    pub status: StepStatus,
    pub outputs: Option<Value>,
    pub deduped: Option<bool>,
    pub error: Option<String>,
    pub error_class: Option<FailureClass>,
    pub retry_after_ms: Option<u64>,
}

impl StepResult {
    pub fn completed(outputs: Value) -> Self {
        Self { status: StepStatus::Completed, outputs: Some(outputs), deduped: None, error: None, error_class: None, retry_after_ms: None }
    }

    pub fn skipped_deduped(previous_outputs: Option<Value>) -> Self {
        Self { status: StepStatus::Skipped, outputs: previous_outputs, deduped: Some(true), error: None, error_class: None, retry_after_ms: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: StepStatus::Failed, outputs: None, deduped: None, error: Some(error.into()), error_class: None, retry_after_ms: None }
    }

    pub fn with_class(mut self, class: FailureClass) -> Self {
        self.error_class = Some(class);
        self
    }

    pub fn with_retry_after_ms(mut self, ms: u64) -> Self {
        self.retry_after_ms = Some(ms);
        self
    }
}
