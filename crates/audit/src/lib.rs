// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Tamper-evident, hash-chained append-only audit trail (§4.4): every
//! workflow action is recorded in two phases, intent before the external
//! effect and result after, redacted before it ever touches disk.

mod error;
mod record;
mod trail;

pub use error::AuditError;
pub use record::{AuditPhase, AuditRecord};
pub use trail::{AuditTrail, ChainVerification, IntentDescriptor};
