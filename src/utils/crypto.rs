// src/utils/crypto.rs
//! Hashing and hex helpers shared by the resolver, key manager and hasher.
//!
//! Uses Keccak-256 (Ethereum's standard hash function) wherever a value has to
//! line up with `did:ethr` conventions: address derivation, synthetic key
//! material and the collision-resistant credential digest.

use ethers_core::utils::{hex, keccak256};

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
///
/// # Example
/// ```
/// use contract_vc::utils::crypto::hash_data;
///
/// let hash = hash_data(b"hello world");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Lowercase hex with a `0x` prefix.
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes hex with or without a `0x` prefix.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, String> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    hex::decode(digits).map_err(|e| format!("invalid hex `{}`: {}", input, e))
}
