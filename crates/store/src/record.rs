// SPDX-License-Identifier: MIT

//! The persisted form of a store record: two reserved fields
//! (`schemaVersion`, `writeEpoch`) plus the caller's payload, serialised
//! as a JSON object with keys in stable lexicographic order.

use serde_json::Value;
use ward_core::canonical_json;

pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";
pub const WRITE_EPOCH_KEY: &str = "writeEpoch";

/// A decoded store record: the reserved envelope fields plus the raw
/// payload object.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    pub schema_version: u32,
    pub write_epoch: u64,
    pub payload: Value,
}

impl StoreRecord {
    pub fn new(schema_version: u32, write_epoch: u64, payload: Value) -> Self {
        Self { schema_version, write_epoch, payload }
    }

    /// Merge the reserved fields into the payload object, producing the
    /// on-disk JSON value.
    pub fn to_json(&self) -> Value {
        let mut object = match &self.payload {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        object.insert(SCHEMA_VERSION_KEY.to_string(), Value::from(self.schema_version));
        object.insert(WRITE_EPOCH_KEY.to_string(), Value::from(self.write_epoch));
        Value::Object(object)
    }

    /// Serialise to canonical (sorted-key) JSON bytes.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let json = self.to_json();
        canonical_json(&json).map(String::into_bytes)
    }

    /// Parse a raw on-disk JSON value into schema version, write epoch,
    /// and the remaining payload (reserved fields stripped).
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else { return None };
        let schema_version = map.remove(SCHEMA_VERSION_KEY)?.as_u64()? as u32;
        let write_epoch = map.remove(WRITE_EPOCH_KEY)?.as_u64()?;
        Some(Self { schema_version, write_epoch, payload: Value::Object(map) })
    }
}
