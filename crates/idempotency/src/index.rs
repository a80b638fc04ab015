// SPDX-License-Identifier: MIT

use crate::error::IdempotencyError;
use crate::record::{IdempotencyRecord, IdempotencyStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use ward_core::Clock;
use ward_store::ResilientStore;

/// Deduplication key -> status record, backed by a Resilient Store (§4.7).
/// `check`/`reserve`/`complete`/`fail` are serialised through an internal
/// mutex so the read-modify-write against the underlying store is atomic
/// from the caller's perspective.
pub struct IdempotencyIndex<C: Clock> {
    store: ResilientStore<HashMap<String, IdempotencyRecord>, C>,
    clock: C,
    guard: Mutex<()>,
}

impl<C: Clock> IdempotencyIndex<C> {
    pub fn new(store: ResilientStore<HashMap<String, IdempotencyRecord>, C>, clock: C) -> Self {
        Self { store, clock, guard: Mutex::new(()) }
    }

    fn load(&self) -> Result<HashMap<String, IdempotencyRecord>, IdempotencyError> {
        Ok(self.store.get()?.unwrap_or_default())
    }

    pub fn check(&self, fingerprint: &str) -> Result<Option<IdempotencyRecord>, IdempotencyError> {
        let _guard = self.guard.lock();
        let records = self.load()?;
        Ok(records.get(fingerprint).cloned())
    }

    /// Reserve a fingerprint, creating a fresh `pending` entry. Fails with
    /// `Conflict` if an entry already exists in `pending` or `completed`.
    /// A `failed` entry may be reserved again, bumping `attempt_count`.
    pub fn reserve(&self, fingerprint: &str) -> Result<IdempotencyRecord, IdempotencyError> {
        let _guard = self.guard.lock();
        let mut records = self.load()?;
        let now = self.clock.epoch_ms();
        let attempt_count = match records.get(fingerprint) {
            Some(existing) if existing.status == IdempotencyStatus::Failed => existing.attempt_count + 1,
            Some(_) => return Err(IdempotencyError::Conflict { fingerprint: fingerprint.to_string() }),
            None => 1,
        };
        let record = IdempotencyRecord::pending(now, attempt_count);
        records.insert(fingerprint.to_string(), record.clone());
        self.store.set(&records)?;
        Ok(record)
    }

    fn finalize(&self, fingerprint: &str, status: IdempotencyStatus, summary: Option<String>) -> Result<IdempotencyRecord, IdempotencyError> {
        let _guard = self.guard.lock();
        let mut records = self.load()?;
        let now = self.clock.epoch_ms();
        let record = records.get_mut(fingerprint).ok_or_else(|| IdempotencyError::NotFound { fingerprint: fingerprint.to_string() })?;
        if record.status != IdempotencyStatus::Pending {
            return Err(IdempotencyError::NotPending { fingerprint: fingerprint.to_string() });
        }
        record.status = status;
        record.completed_at_ms = Some(now);
        record.outcome_summary = summary;
        let updated = record.clone();
        self.store.set(&records)?;
        Ok(updated)
    }

    pub fn complete(&self, fingerprint: &str, outcome_summary: impl Into<String>) -> Result<IdempotencyRecord, IdempotencyError> {
        self.finalize(fingerprint, IdempotencyStatus::Completed, Some(outcome_summary.into()))
    }

    pub fn fail(&self, fingerprint: &str, error_summary: impl Into<String>) -> Result<IdempotencyRecord, IdempotencyError> {
        self.finalize(fingerprint, IdempotencyStatus::Failed, Some(error_summary.into()))
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
