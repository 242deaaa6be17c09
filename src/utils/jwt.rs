// src/utils/jwt.rs
//! Compact JWS for ES256K (ECDSA over secp256k1 with SHA-256).
//!
//! Only what credential proofs need: building the signing input, appending a
//! signature, splitting a token back apart and checking it against a public
//! key. Signing itself happens behind [`crate::wallet::signer::CredentialSigner`].

use crate::error::TokenError;
use crate::utils::serialization::{base64url_decode, base64url_encode};
use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const ES256K: &str = "ES256K";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JwsHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for JwsHeader {
    fn default() -> Self {
        Self {
            alg: ES256K.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// `base64url(header) "." base64url(claims)`
pub fn signing_input<C: Serialize>(claims: &C) -> Result<String, serde_json::Error> {
    let header = serde_json::to_vec(&JwsHeader::default())?;
    let payload = serde_json::to_vec(claims)?;
    Ok(format!("{}.{}", base64url_encode(&header), base64url_encode(&payload)))
}

/// Appends an encoded signature to a signing input.
pub fn assemble(signing_input: &str, signature: &[u8]) -> String {
    format!("{}.{}", signing_input, base64url_encode(signature))
}

/// A decoded compact JWS.
#[derive(Debug, Clone)]
pub struct CompactJws {
    header: JwsHeader,
    signing_input: String,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl CompactJws {
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
            return Err(TokenError::Malformed(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };
        if header_b64.is_empty() || payload_b64.is_empty() || signature_b64.is_empty() {
            return Err(TokenError::Malformed("empty segment".to_string()));
        }

        let header: JwsHeader = serde_json::from_slice(&base64url_decode(header_b64)?)?;
        if header.alg != ES256K {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        Ok(Self {
            header,
            signing_input: format!("{}.{}", header_b64, payload_b64),
            payload: base64url_decode(payload_b64)?,
            signature: base64url_decode(signature_b64)?,
        })
    }

    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// Checks the signature over the signing input.
    pub fn verify(&self, key: &VerifyingKey) -> Result<(), TokenError> {
        let signature = Signature::from_slice(&self.signature).map_err(|_| TokenError::BadSignature)?;
        key.verify(self.signing_input.as_bytes(), &signature)
            .map_err(|_| TokenError::BadSignature)
    }

    /// Decodes the payload. Does not check the signature.
    pub fn claims<T: DeserializeOwned>(&self) -> Result<T, TokenError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}
