// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Boot is the only phase that may abort the process (§4.1). Every other
/// subsystem failure after boot is converted into a degraded mode or a
/// step failure instead.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),
    #[error("data directory inaccessible: {0}")]
    DataDirInaccessible(String),
    #[error("a data directory is already locked by pid {pid:?}")]
    Locked { pid: Option<u32> },
    #[error("critical subsystem(s) failed and dev mode is not allowed: {0:?}")]
    CriticalFailure(Vec<String>),
    #[error(transparent)]
    Redact(#[from] ward_redact::RedactError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
