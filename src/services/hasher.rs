// src/services/hasher.rs
//! Credential fingerprints for on-chain anchoring.
//!
//! Both values are computed over the canonical JSON of the credential, so
//! in-memory field order never changes the result:
//!
//! - [`fingerprint`]: the canonical bytes hex-encoded and cut to 64 hex
//!   characters, `0x`-prefixed. This is the value the dashboard anchors.
//!   Credentials sharing their first 32 canonical bytes (which, with the
//!   fixed `@context`, is all of them) share a fingerprint.
//! - [`content_digest`]: Keccak-256 of the canonical bytes, which does
//!   change with every field.

use crate::models::credential::VerifiableCredential;
use crate::utils::crypto::{hash_data, to_hex_prefixed};
use crate::utils::serialization::to_canonical_string;
use ethers_core::utils::hex;

/// Hex characters kept by [`fingerprint`] (32 bytes).
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// `0x` + the first 64 hex characters of the canonical JSON bytes.
pub fn fingerprint(vc: &VerifiableCredential) -> Result<String, serde_json::Error> {
    let canonical = to_canonical_string(vc)?;
    let mut encoded = hex::encode(canonical.as_bytes());
    encoded.truncate(FINGERPRINT_HEX_LEN);
    while encoded.len() < FINGERPRINT_HEX_LEN {
        encoded.push('0');
    }
    Ok(format!("0x{}", encoded))
}

/// `0x` + Keccak-256 of the canonical JSON bytes.
pub fn content_digest(vc: &VerifiableCredential) -> Result<String, serde_json::Error> {
    let canonical = to_canonical_string(vc)?;
    Ok(to_hex_prefixed(&hash_data(canonical.as_bytes())))
}
