//! # Canonical Encoding
//!
//! Deterministic JSON used as hash input for the audit chain.
//!
//! ## Rules
//!
//! - Object keys are emitted in byte-wise sorted order at every depth.
//! - No insignificant whitespace.
//! - Strings use JSON escaping as produced by `serde_json`.
//! - Numbers use `serde_json`'s shortest round-trip representation.
//!
//! Key order is imposed here instead of relying on `serde_json::Map`, whose
//! ordering depends on the `preserve_order` feature of the final build.

use crate::entities::Hash;
use crate::errors::CanonicalError;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize `value` into its canonical JSON form.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CanonicalError> {
    let value = serde_json::to_value(value)?;
    let mut out = String::new();
    write_value(&value, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut String) -> Result<(), CanonicalError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&serde_json::to_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_value(&map[key], out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

/// One-shot SHA-256 over several byte slices.
pub fn sha256(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Lowercase hex rendering of a digest.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a 64-character hex digest.
pub fn parse_hash_hex(s: &str) -> Result<Hash, CanonicalError> {
    let bytes = hex::decode(s).map_err(|e| CanonicalError::InvalidHash(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| CanonicalError::InvalidHash(format!("expected 32 bytes: {s}")))
}

/// Serde adapter storing a [`Hash`] as lowercase hex.
pub mod hex_hash {
    use super::{hash_hex, parse_hash_hex};
    use crate::entities::Hash;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hash_hex(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hash_hex(&s).map_err(serde::de::Error::custom)
    }
}
