//! Byte string ordering and `0x` hex conversion.

use std::cmp::Ordering;

use crate::{Error, Result, hash::Hash};

/// Lexicographic comparison of unsigned bytes. On a common prefix the shorter
/// input orders first.
pub fn compare_bytes(a: &[u8], b: &[u8]) -> Ordering {
    // slice ordering is exactly this rule for u8
    a.cmp(b)
}

/// Encode bytes as a lowercase `0x`-prefixed hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a `0x`-prefixed hex string. Upper and lower case digits are
/// accepted; the prefix is mandatory.
pub fn from_hex(s: &str) -> Result<Vec<u8>> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| Error::Format(format!("missing 0x prefix in {:?}", s)))?;
    Ok(hex::decode(digits)?)
}

/// Decode a `0x`-prefixed hex string that must hold exactly one hash.
pub fn hash_from_hex(s: &str) -> Result<Hash> {
    let bytes = from_hex(s)?;
    bytes.as_slice().try_into().map_err(|_| {
        Error::Format(format!(
            "expected 32 bytes, got {} in {:?}",
            bytes.len(),
            s
        ))
    })
}
