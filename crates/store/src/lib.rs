// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Resilient single-file-per-store JSON persistence (§4.2).
//!
//! Each [`ResilientStore`] owns exactly one file and guarantees: a
//! successful `set` is durable before it returns; a crash at any point
//! during `set` leaves `get` able to recover the previous or the new
//! value, never a partial read; and corrupt data is quarantined rather
//! than silently dropped.

mod factory;
mod migration;
mod record;
mod store;

pub use factory::StoreFactory;
pub use migration::{Migration, MigrationRegistry};
pub use record::StoreRecord;
pub use store::{ResilientStore, StoreConfig, StoreError};
