// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Secret redaction and a redaction-enforcing logger.
//!
//! [`Redactor`] is a pure function from text or structured JSON to a
//! redacted variant. [`Logger`] wraps `tracing` and guarantees every
//! message and structured payload passes through a `Redactor` first —
//! it is the only sanctioned path for logging a workflow payload.

mod logger;
mod patterns;
mod redactor;

pub use logger::{Level, LogSink, Logger, MemorySink, TracingSink};
pub use patterns::ExtraPattern;
pub use redactor::{RedactError, Redactor};
