//! Core type aliases and constants for the Strata account-state store.
//!
//! These types are used across the store engine, its collaborators, and the
//! wire codec.

/// 32-byte digest used for trie roots, state-delta hashes, and derived keys.
pub type Hash = [u8; 32];

/// 20-byte account address.
pub type Address = [u8; 20];

/// A zero-valued hash (32 zero bytes).
///
/// Doubles as the distinguished "empty" digest: an all-zero state delta
/// hashes to `ZERO_HASH` rather than to the hash of its zero bytes.
pub const ZERO_HASH: Hash = [0u8; 32];

/// A zero-valued address (20 zero bytes).
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Convert a byte slice to a `0x`-prefixed hex string for display purposes.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    for byte in bytes {
        use core::fmt::Write;
        let _ = write!(s, "{:02x}", byte);
    }
    s
}

/// Encode a u64 as little-endian bytes.
pub fn u64_to_le_bytes(v: u64) -> [u8; 8] {
    v.to_le_bytes()
}

/// Decode a u64 from little-endian bytes.
pub fn u64_from_le_bytes(bytes: &[u8]) -> Option<u64> {
    if bytes.len() < 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    Some(u64::from_le_bytes(buf))
}

/// Encode a u128 as little-endian bytes.
pub fn u128_to_le_bytes(v: u128) -> [u8; 16] {
    v.to_le_bytes()
}

/// Decode a u128 from little-endian bytes.
pub fn u128_from_le_bytes(bytes: &[u8]) -> Option<u128> {
    if bytes.len() < 16 {
        return None;
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&bytes[..16]);
    Some(u128::from_le_bytes(buf))
}
