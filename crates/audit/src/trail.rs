// SPDX-License-Identifier: MIT

use crate::error::AuditError;
use crate::record::{AuditPhase, AuditRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use ward_core::{iso8601_from_epoch_ms, Clock};
use ward_redact::Redactor;

/// Result of `recordIntent`: the caller's workflow/step identity, action,
/// target, and an unredacted payload which is routed through the
/// [`Redactor`] before it ever reaches the trail.
pub struct IntentDescriptor {
    pub workflow_id: String,
    pub step_id: Option<String>,
    pub action: String,
    pub target: String,
    pub payload: Value,
}

pub struct ChainVerification {
    pub valid: bool,
    pub record_count: usize,
    pub first_broken_seq: Option<u64>,
    pub mismatched_checksums: Vec<u64>,
}

/// The workflow/step/action/target context an intent record was opened
/// with, kept around so the closing result record can carry the same
/// context instead of leaving it blank.
#[derive(Clone)]
struct IntentContext {
    workflow_id: String,
    step_id: Option<String>,
    action: String,
    target: String,
}

/// Tamper-evident, append-only, hash-chained audit trail (§4.4).
pub struct AuditTrail<C: Clock> {
    path: PathBuf,
    file: File,
    clock: C,
    redactor: Redactor,
    hmac_key: Option<Vec<u8>>,
    next_seq: u64,
    last_checksum: Option<String>,
    pending_intents: BTreeMap<u64, IntentContext>,
}

impl<C: Clock> AuditTrail<C> {
    pub fn open(path: PathBuf, clock: C, redactor: Redactor, hmac_key: Option<Vec<u8>>) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let (next_seq, last_checksum, pending_intents) = Self::rebuild_state(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file, clock, redactor, hmac_key, next_seq, last_checksum, pending_intents })
    }

    fn rebuild_state(path: &Path) -> Result<(u64, Option<String>, BTreeMap<u64, IntentContext>), io::Error> {
        if !path.exists() {
            return Ok((1, None, BTreeMap::new()));
        }
        let file = File::open(path)?;
        let reader = io::BufReader::new(file);
        let mut next_seq = 1;
        let mut last_checksum = None;
        let mut pending = BTreeMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: AuditRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(_) => {
                    warn!("audit trail contains an unparseable trailing record, stopping state rebuild");
                    break;
                }
            };
            next_seq = record.seq + 1;
            last_checksum = Some(record.checksum.clone());
            match record.phase {
                AuditPhase::Intent => {
                    pending.insert(
                        record.seq,
                        IntentContext {
                            workflow_id: record.workflow_id.clone(),
                            step_id: record.step_id.clone(),
                            action: record.action.clone(),
                            target: record.target.clone(),
                        },
                    );
                }
                AuditPhase::Result => {
                    if let Some(intent_seq) = record.intent_seq {
                        pending.remove(&intent_seq);
                    }
                }
            }
        }
        Ok((next_seq, last_checksum, pending))
    }

    pub fn record_intent(&mut self, descriptor: IntentDescriptor) -> Result<u64, AuditError> {
        let redacted = self.redactor.redact_value(&descriptor.payload);
        let seq = self.next_seq;
        let timestamp = iso8601_from_epoch_ms(self.clock.epoch_ms());
        let context = IntentContext {
            workflow_id: descriptor.workflow_id.clone(),
            step_id: descriptor.step_id.clone(),
            action: descriptor.action.clone(),
            target: descriptor.target.clone(),
        };
        let record = AuditRecord::new(
            seq,
            timestamp,
            AuditPhase::Intent,
            descriptor.workflow_id,
            descriptor.step_id,
            descriptor.action,
            descriptor.target,
            redacted,
            None,
            self.last_checksum.clone(),
            self.hmac_key.as_deref(),
        );
        self.append(&record)?;
        self.pending_intents.insert(seq, context);
        Ok(seq)
    }

    pub fn record_result(&mut self, intent_seq: u64, outcome: Value) -> Result<u64, AuditError> {
        let Some(context) = self.pending_intents.get(&intent_seq).cloned() else {
            return Err(AuditError::InvalidBackReference { seq: intent_seq });
        };
        let redacted = self.redactor.redact_value(&outcome);
        let seq = self.next_seq;
        let timestamp = iso8601_from_epoch_ms(self.clock.epoch_ms());
        let record = AuditRecord::new(
            seq,
            timestamp,
            AuditPhase::Result,
            context.workflow_id,
            context.step_id,
            context.action,
            context.target,
            redacted,
            Some(intent_seq),
            self.last_checksum.clone(),
            self.hmac_key.as_deref(),
        );
        self.append(&record)?;
        self.pending_intents.remove(&intent_seq);
        Ok(seq)
    }

    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{line}")?;
        self.file.sync_all()?;
        self.next_seq = record.seq + 1;
        self.last_checksum = Some(record.checksum.clone());
        Ok(())
    }

    pub fn pending_intents(&self) -> Vec<u64> {
        self.pending_intents.keys().copied().collect()
    }

    /// Walk the file linearly, verifying the chain and every self-checksum.
    pub fn verify_chain(&self) -> Result<ChainVerification, AuditError> {
        if !self.path.exists() {
            return Ok(ChainVerification { valid: true, record_count: 0, first_broken_seq: None, mismatched_checksums: Vec::new() });
        }
        let file = File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        let mut record_count = 0;
        let mut first_broken_seq = None;
        let mut mismatched = Vec::new();
        let mut expected_prev: Option<String> = None;

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: AuditRecord = serde_json::from_str(&line)?;
            record_count += 1;

            let checksum_ok = record.verify(self.hmac_key.as_deref());
            let chain_ok = record.prev_checksum == expected_prev;
            if !checksum_ok || !chain_ok {
                mismatched.push(record.seq);
                if first_broken_seq.is_none() {
                    first_broken_seq = Some(record.seq);
                }
            }
            expected_prev = Some(record.checksum.clone());
        }

        Ok(ChainVerification { valid: mismatched.is_empty(), record_count, first_broken_seq, mismatched_checksums: mismatched })
    }

    /// Flush buffered writes and fsync. Each `append` already fsyncs, so
    /// this is only needed as an explicit final barrier (e.g. at shutdown)
    /// for callers that do not own the trail outright.
    pub fn flush(&mut self) -> Result<(), AuditError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn close(mut self) -> Result<(), AuditError> {
        self.flush()
    }
}

#[cfg(test)]
#[path = "trail_tests.rs"]
mod tests;
