// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Rolling-window circuit breaker (§4.6) and default failure classification
//! rule table (§4.6 classification table).

mod breaker;
mod classify;
mod error;
mod state;

pub use breaker::{BreakerConfig, CircuitBreaker, ExecuteError};
pub use classify::{classify_failure, FailureSignal};
pub use error::BreakerError;
pub use state::CircuitState;
