// SPDX-License-Identifier: MIT

use thiserror::Error;
use ward_store::StoreError;

#[derive(Debug, Error)]
pub enum IdempotencyError {
    #[error("fingerprint {fingerprint} already has a pending or completed entry")]
    Conflict { fingerprint: String },
    #[error("fingerprint {fingerprint} has no entry to transition")]
    NotFound { fingerprint: String },
    #[error("fingerprint {fingerprint} is not pending (status is already final)")]
    NotPending { fingerprint: String },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
