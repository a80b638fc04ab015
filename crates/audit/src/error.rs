// SPDX-License-Identifier: MIT

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("redaction error: {0}")]
    Redact(#[from] ward_redact::RedactError),
    #[error("recordResult referenced intent seq {seq} which does not exist or is not an intent")]
    InvalidBackReference { seq: u64 },
}
