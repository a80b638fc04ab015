// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BreakerError {
    #[error("circuit is open, retry after {retry_after_ms}ms")]
    CircuitOpen { retry_after_ms: u64 },
}
