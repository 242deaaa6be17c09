// src/wallet/signer.rs
//! The seam between credential issuance and key custody.
//!
//! The issuer never holds a secret key itself; it asks a [`CredentialSigner`]
//! for a signature over the JWS signing input. [`KeyReference`] is the default
//! signer and loads key material at signing time, so a missing or broken key
//! shows up as a [`SigningError`] on that one issuance rather than at startup.

use crate::error::SigningError;
use crate::wallet::key_management::KeyManager;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

/// Produces ES256K signatures on behalf of the issuer.
#[async_trait]
pub trait CredentialSigner: Send + Sync {
    /// Returns the 64-byte `r || s` signature over `message`.
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError>;
}

#[async_trait]
impl CredentialSigner for KeyManager {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        Ok(self.sign_message(message))
    }
}

/// Where the issuer's secret key comes from.
///
/// In configuration files this is written as
/// `{ source = "env", value = "ISSUER_PRIVATE_KEY" }` or
/// `{ source = "inline", value = "0x..." }`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "lowercase")]
pub enum KeyReference {
    /// Hex-encoded secret key held directly in configuration
    Inline(String),
    /// Name of an environment variable holding the hex-encoded secret key
    Env(String),
}

impl KeyReference {
    /// Reads and parses the referenced key.
    pub fn load(&self) -> Result<KeyManager, SigningError> {
        match self {
            KeyReference::Inline(secret) => KeyManager::from_hex(secret),
            KeyReference::Env(var) => {
                debug!("Loading issuer key from ${}", var);
                let secret = std::env::var(var)
                    .map_err(|e| SigningError::KeyUnavailable(format!("${}: {}", var, e)))?;
                KeyManager::from_hex(&secret)
            }
        }
    }
}

impl std::fmt::Debug for KeyReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyReference::Inline(_) => f.write_str("Inline(<redacted>)"),
            KeyReference::Env(var) => f.debug_tuple("Env").field(var).finish(),
        }
    }
}

#[async_trait]
impl CredentialSigner for KeyReference {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        let key = self.load()?;
        Ok(key.sign_message(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[tokio::test]
    async fn test_inline_reference_signs() {
        let reference = KeyReference::Inline(KEY.to_string());
        let signature = reference.sign(b"payload").await.unwrap();
        assert_eq!(signature, KeyManager::from_hex(KEY).unwrap().sign_message(b"payload"));
    }

    #[tokio::test]
    async fn test_missing_env_var_is_unavailable() {
        let reference = KeyReference::Env("CONTRACT_VC_TEST_KEY_THAT_IS_NEVER_SET".to_string());
        let result = reference.sign(b"payload").await;
        assert!(matches!(result, Err(SigningError::KeyUnavailable(_))));
    }

    #[test]
    fn test_debug_redacts_inline_secret() {
        let shown = format!("{:?}", KeyReference::Inline(KEY.to_string()));
        assert_eq!(shown, "Inline(<redacted>)");
    }

    #[test]
    fn test_reference_deserializes_from_tagged_form() {
        let parsed: KeyReference =
            serde_json::from_str(r#"{"source":"env","value":"ISSUER_KEY"}"#).unwrap();
        assert_eq!(parsed, KeyReference::Env("ISSUER_KEY".to_string()));
    }
}
