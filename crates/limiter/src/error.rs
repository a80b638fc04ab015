// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LimiterError {
    #[error("invalid rate limiter configuration: {0}")]
    InvalidConfig(String),
}
