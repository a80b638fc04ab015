// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Infra-level failures: something the step pipeline itself could not
/// recover from (disk I/O, serialization). Ordinary step failures are
/// reported through [`crate::StepResult`], not this type.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("audit trail error: {0}")]
    Audit(#[from] ward_audit::AuditError),
    #[error("idempotency index error: {0}")]
    Idempotency(#[from] ward_idempotency::IdempotencyError),
}
