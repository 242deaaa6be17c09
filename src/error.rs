// src/error.rs
//! Error types for the contract credential core.
//!
//! None of these escape the three public pipeline operations: resolution
//! failures travel inside [`crate::services::did_resolver::Resolution`],
//! signing failures inside [`crate::services::credential_issuer::Issuance`],
//! and token failures are folded into a
//! [`crate::services::verifier::VerificationResult`].

use thiserror::Error;

/// Errors raised while looking up a DID document.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The input is not of the form `did:<method>:<identifier>`
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// No resolver endpoint is configured for the DID method
    #[error("no resolver endpoint configured for method `{0}`")]
    UnsupportedMethod(String),

    /// The endpoint answered but knows nothing about the DID
    #[error("DID not found: {0}")]
    NotFound(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The endpoint answered with something that is not a DID document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while producing a credential proof.
#[derive(Error, Debug)]
pub enum SigningError {
    /// The configured key reference could not be read
    #[error("issuer key unavailable: {0}")]
    KeyUnavailable(String),

    /// Key material was found but is not a valid secp256k1 secret key
    #[error("invalid issuer key: {0}")]
    InvalidKey(String),

    /// The signing backend refused or failed
    #[error("signing backend error: {0}")]
    Backend(String),

    /// The credential could not be encoded as JWT claims
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while decoding or checking a compact JWS.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Wrong number of segments, empty segments and similar
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Header names an algorithm other than ES256K
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("base64 error: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The public key could not be parsed
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// The signature does not verify under the given key
    #[error("signature does not verify")]
    BadSignature,
}

/// Errors raised while loading [`crate::config::Settings`].
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}
