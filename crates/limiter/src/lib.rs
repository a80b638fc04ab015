// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Dual token-bucket rate limiter (§4.5): a shared global bucket and a
//! per-workflow bucket created on demand, with exponential backoff and
//! secondary-signal hold-offs.

mod bucket;
mod error;
mod limiter;

pub use error::LimiterError;
pub use limiter::{BucketKind, RateLimitSignal, RateLimiter, RateLimiterConfig, TryConsumeResult};
