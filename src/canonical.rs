//! Canonical serialization for result fingerprints.
//!
//! Ingestion, redline and grounding outputs are fingerprinted by hashing their
//! canonical JSON form. Two runs over the same input with the same policy
//! must produce the same fingerprint.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Stable Vec order: vectors serialize in index order
//! - No HashMap in hashed data: keyed inputs use `BTreeMap`

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes.
///
/// Values that cannot be represented as JSON hash as the empty byte string.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// Compute the canonical xxh64 hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Canonical hash as 16 lowercase hex characters.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
