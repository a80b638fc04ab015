// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Hardened executor (§4.9): composes the policy, idempotency, rate
//! limiter, circuit breaker, and audit trail subsystems around a
//! caller-supplied [`StepRunner`].

mod error;
mod executor;
mod types;

pub use error::ExecutorError;
pub use executor::HardenedExecutor;
pub use types::{Capability, StepDescriptor, StepOutcome, StepRaise, StepResult, StepRunner, StepStatus};
