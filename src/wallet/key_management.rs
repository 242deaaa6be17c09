// src/wallet/key_management.rs
//! Issuer key material.
//!
//! Holds a secp256k1 signing key and derives what the rest of the core needs
//! from it:
//! - ES256K signatures (ECDSA, SHA-256 prehash, RFC 6979 nonces) via `k256`
//! - the Ethereum address and `did:ethr` identifier (Keccak-256)
//! - the hex public key published in DID documents

use crate::error::{SigningError, TokenError};
use crate::utils::crypto::{decode_hex, hash_data, to_hex_prefixed};
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;

/// secp256k1 key pair used to sign credentials.
#[derive(Clone)]
pub struct KeyManager {
    /// Never exposed
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyManager {
    /// Generates a fresh key from the operating-system RNG.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Loads a 32-byte secret key given as hex (`0x` prefix optional).
    pub fn from_hex(secret_hex: &str) -> Result<Self, SigningError> {
        let bytes = decode_hex(secret_hex.trim()).map_err(SigningError::InvalidKey)?;
        if bytes.len() != 32 {
            return Err(SigningError::InvalidKey(format!(
                "expected 32 bytes of key material, got {}",
                bytes.len()
            )));
        }
        let signing_key =
            SigningKey::from_slice(&bytes).map_err(|e| SigningError::InvalidKey(e.to_string()))?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = *signing_key.verifying_key();
        KeyManager {
            signing_key,
            verifying_key,
        }
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Compressed SEC1 public key, `0x`-prefixed hex.
    pub fn public_key_hex(&self) -> String {
        to_hex_prefixed(self.verifying_key.to_encoded_point(true).as_bytes())
    }

    /// Ethereum address: last 20 bytes of Keccak-256 over the uncompressed
    /// public key without its `0x04` tag. Lowercase hex.
    pub fn ethr_address(&self) -> String {
        let point = self.verifying_key.to_encoded_point(false);
        let hash = hash_data(&point.as_bytes()[1..]);
        to_hex_prefixed(&hash[12..])
    }

    /// `did:ethr:<address>`
    pub fn ethr_did(&self) -> String {
        format!("did:ethr:{}", self.ethr_address())
    }

    /// Signs a message as ES256K.
    ///
    /// # Returns
    /// 64-byte compact signature (R || S), low-S normalized
    pub fn sign_message(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Parses a SEC1 public key (compressed or uncompressed) from hex.
pub fn parse_public_key_hex(public_key_hex: &str) -> Result<VerifyingKey, TokenError> {
    let bytes = decode_hex(public_key_hex).map_err(TokenError::InvalidKey)?;
    VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| TokenError::InvalidKey(e.to_string()))
}
