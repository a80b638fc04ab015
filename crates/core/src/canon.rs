// SPDX-License-Identifier: MIT

//! Canonical JSON serialisation and content checksums.
//!
//! Every hash-chained or sorted-key artifact (store records, WAL entries,
//! audit records) goes through [`canonical_json`] before being hashed or
//! written, so two equal values always serialise to the same bytes.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sort object keys so serialisation is deterministic
/// regardless of insertion order.
pub fn sort_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), sort_value(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        other => other.clone(),
    }
}

/// Serialise any `Serialize` value to canonical (sorted-key) JSON text.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let raw = serde_json::to_value(value)?;
    let sorted = sort_value(&raw);
    serde_json::to_string(&sorted)
}

/// Truncated SHA-256 checksum of `bytes`, hex-encoded (32 hex chars / 16 bytes).
///
/// A truncated digest is sufficient here: the checksum is a tamper-evidence
/// and dedup signal, not a cryptographic commitment requiring full 256-bit
/// collision resistance.
pub fn checksum_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex_encode(&digest[..16])
}

/// Full SHA-256 checksum of `bytes`, hex-encoded.
pub fn full_checksum_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex_encode(&digest)
}

/// HMAC-SHA256 of `bytes` under `key`, hex-encoded.
pub fn hmac_hex(key: &[u8], bytes: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    type HmacSha256 = Hmac<Sha256>;
    // A key of any length is valid for HMAC; construction cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(bytes);
    hex_encode(&mac.finalize().into_bytes())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_value_orders_nested_object_keys() {
        let value = json!({"b": 1, "a": {"z": 1, "y": 2}});
        let sorted = sort_value(&value);
        let text = serde_json::to_string(&sorted).unwrap();
        assert_eq!(text, r#"{"a":{"y":2,"z":1},"b":1}"#);
    }

    #[test]
    fn canonical_json_is_insensitive_to_field_order() {
        #[derive(serde::Serialize)]
        struct A {
            b: u32,
            a: u32,
        }
        #[derive(serde::Serialize)]
        struct B {
            a: u32,
            b: u32,
        }
        let a = canonical_json(&A { b: 2, a: 1 }).unwrap();
        let b = canonical_json(&B { a: 1, b: 2 }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn checksum_changes_with_content() {
        let c1 = checksum_hex(b"hello");
        let c2 = checksum_hex(b"hellp");
        assert_ne!(c1, c2);
        assert_eq!(checksum_hex(b"hello"), c1);
    }

    #[test]
    fn hmac_depends_on_key() {
        let m1 = hmac_hex(b"key1", b"payload");
        let m2 = hmac_hex(b"key2", b"payload");
        assert_ne!(m1, m2);
    }
}
