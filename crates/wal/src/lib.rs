// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Single-writer segmented write-ahead log (§4.3): locked directory,
//! checksummed entries, two-phase rotation, and crash-safe replay.

mod checkpoint;
mod entry;
mod lock;
mod segment;
mod wal;

pub use checkpoint::{Checkpoint, RotationPhase};
pub use entry::{WalEntry, WalOp};
pub use wal::{ReplayOutcome, Wal, WalConfig, WalError};
