//! Snapshot hashing for determinism checks.
//!
//! Uses FNV-1a for fast, deterministic hashing of field state. Not
//! cryptographically secure; the hash exists to compare two runs
//! bit-for-bit.

use crate::snapshot::Snapshot;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// Hash every value of every entry in a snapshot.
///
/// Subdomain id and field name are folded in at each entry boundary, so
/// moving data between fields changes the hash. Values are hashed by
/// `f64::to_bits`, which distinguishes `0.0` from `-0.0`.
///
/// Returns `FNV_OFFSET` for an empty snapshot.
pub fn snapshot_hash(snapshot: &Snapshot<'_>) -> u64 {
    let mut hash = FNV_OFFSET;
    for entry in snapshot.iter() {
        hash = fnv1a_bytes(hash, &entry.subdomain.0.to_le_bytes());
        hash = fnv1a_bytes(hash, entry.field.as_bytes());
        for &v in entry.data {
            hash = fnv1a_bytes(hash, &v.to_bits().to_le_bytes());
        }
    }
    hash
}
