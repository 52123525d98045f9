//! Canonical JSON encoding for sign bytes.
//!
//! Signatures are checked against bytes, so every signer and verifier must
//! agree on exactly one byte sequence per value. The encoder here fixes
//! every degree of freedom JSON leaves open:
//!
//! - object keys sorted by byte order, at every depth
//! - array elements kept in order
//! - no insignificant whitespace
//! - strings escaped the way `serde_json` escapes them
//! - integers in plain decimal; floats are rejected
//!
//! u64 fields that must survive 53-bit JSON consumers are serialized as
//! decimal strings by their owning types (see `serde_with::DisplayFromStr`).

use serde::Serialize;
use serde_json::Value;

use crate::{MarketError, Result};

/// Serialize `value` and encode it canonically.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let tree = serde_json::to_value(value)?;
    encode_value(&tree)
}

/// Re-encode arbitrary JSON bytes canonically.
///
/// Equivalent inputs that differ only in key order or whitespace produce
/// identical output.
pub fn sort_json(bytes: &[u8]) -> Result<Vec<u8>> {
    let tree: Value = serde_json::from_slice(bytes)?;
    encode_value(&tree)
}

/// Canonically encode an already-parsed JSON value.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    let mut out = String::with_capacity(128);
    write_value(value, &mut out)?;
    Ok(out.into_bytes())
}

fn write_value(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                out.push_str(&u.to_string());
            } else if let Some(i) = n.as_i64() {
                out.push_str(&i.to_string());
            } else {
                return Err(MarketError::Serialization(format!(
                    "non-integer number {n} has no canonical encoding"
                )));
            }
        }
        Value::String(s) => write_string(s, out)?,
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
            keys.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out)?;
                out.push(':');
                write_value(&map[key.as_str()], out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_string(s: &str, out: &mut String) -> Result<()> {
    out.push_str(&serde_json::to_string(s)?);
    Ok(())
}
