// src/utils/serialization.rs
//! Serialization utilities for the credential core.
//!
//! Provides:
//! - Canonical JSON (object keys sorted at every nesting level, compact
//!   separators) used for fingerprints and JWT claim comparison
//! - base64url (no padding) encoding for compact JWS segments

use serde::Serialize;

/// Serializes a value to canonical JSON (RFC 8785, JCS).
///
/// Object keys are sorted at every level, arrays keep their order, and no
/// whitespace is emitted. The output does not depend on the field order of
/// the in-memory value or on serde_json's map backing.
pub fn to_canonical_string<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_jcs::to_string(data)
}

/// base64url without padding, as used by compact JWS.
pub fn base64url_encode(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}

/// Inverse of [`base64url_encode`].
pub fn base64url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::decode_config(data, base64::URL_SAFE_NO_PAD)
}
