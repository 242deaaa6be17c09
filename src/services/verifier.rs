// src/services/verifier.rs
//! Credential verification service.
//!
//! Checks a credential's embedded JWT proof against issuer key material and
//! reports the outcome as a [`VerificationResult`] instead of an error.
//!
//! # Process Flow
//! 1. No proof: `unsigned`
//! 2. Proof does not name a key of the issuer, token malformed, or signature
//!    does not verify against the issuer key material: `signature-mismatch`.
//!    Key material is a trusted key for the issuer if one is registered,
//!    otherwise the `assertionMethod` key named by `proof.verificationMethod`
//!    in the resolved issuer document. A synthesized document carries no
//!    usable key, so it always ends here.
//! 3. Token genuine but its claims describe a different credential:
//!    `content-mismatch`
//!
//! Where the key material came from is reported separately as
//! [`IssuerResolution`].

use crate::models::credential::{Attestation, CredentialClaims, Proof, VerifiableCredential};
use crate::services::did_resolver::{DidResolver, Resolution};
use crate::utils::jwt::CompactJws;
use crate::utils::serialization::to_canonical_string;
use crate::wallet::key_management::parse_public_key_hex;
use k256::ecdsa::VerifyingKey;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Why a credential did not verify.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationFailure {
    Unsigned,
    SignatureMismatch,
    ContentMismatch,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerificationFailure::Unsigned => "unsigned",
            VerificationFailure::SignatureMismatch => "signature-mismatch",
            VerificationFailure::ContentMismatch => "content-mismatch",
        })
    }
}

/// Where the issuer key material was taken from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IssuerResolution {
    /// Registered in [`TrustedIssuers`], no lookup made
    Trusted,
    Resolved,
    /// Resolution fell back to the synthetic document
    Synthesized,
}

/// Outcome of [`Verifier::verify`], shaped for display layers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerificationFailure>,
    /// `None` when verification stopped before any key was looked up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_resolution: Option<IssuerResolution>,
}

impl VerificationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
            issuer_resolution: None,
        }
    }

    pub fn invalid(reason: VerificationFailure) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            issuer_resolution: None,
        }
    }

    pub fn with_issuer_resolution(mut self, resolution: Option<IssuerResolution>) -> Self {
        self.issuer_resolution = resolution;
        self
    }
}

/// Issuer keys accepted without resolution.
#[derive(Debug, Clone, Default)]
pub struct TrustedIssuers {
    keys: HashMap<String, VerifyingKey>,
}

impl TrustedIssuers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, issuer_did: impl Into<String>, key: VerifyingKey) -> Self {
        self.keys.insert(issuer_did.into(), key);
        self
    }

    pub fn key_for(&self, issuer_did: &str) -> Option<&VerifyingKey> {
        self.keys.get(issuer_did)
    }
}

/// Verifies contract credentials.
#[derive(Clone)]
pub struct Verifier {
    resolver: DidResolver,
    trusted: TrustedIssuers,
}

impl Verifier {
    pub fn new(resolver: DidResolver) -> Self {
        Self {
            resolver,
            trusted: TrustedIssuers::default(),
        }
    }

    pub fn with_trusted_issuers(mut self, trusted: TrustedIssuers) -> Self {
        self.trusted = trusted;
        self
    }

    /// Verifies `vc`. Read-only apart from at most one DID resolution.
    pub async fn verify(&self, vc: &VerifiableCredential) -> VerificationResult {
        let mut resolution = None;
        let result = match self.check(vc, &mut resolution).await {
            Ok(()) => {
                info!("Credential {} verified", vc.credential_subject.id);
                VerificationResult::valid()
            }
            Err(failure) => {
                warn!("Credential {} failed verification: {}", vc.credential_subject.id, failure);
                VerificationResult::invalid(failure)
            }
        };
        if resolution == Some(IssuerResolution::Synthesized) {
            warn!("Issuer {} was checked against a synthesized document", vc.issuer);
        }
        result.with_issuer_resolution(resolution)
    }

    async fn check(
        &self,
        vc: &VerifiableCredential,
        resolution: &mut Option<IssuerResolution>,
    ) -> Result<(), VerificationFailure> {
        let proof = match vc.attestation() {
            Attestation::Signed(proof) => proof,
            Attestation::Unsigned => return Err(VerificationFailure::Unsigned),
        };

        if !names_issuer_key(proof, &vc.issuer) {
            debug!(
                "{} is not a key of issuer {}",
                proof.verification_method, vc.issuer
            );
            return Err(VerificationFailure::SignatureMismatch);
        }

        let token = CompactJws::parse(&proof.jwt).map_err(|e| {
            debug!("Unparseable proof token: {}", e);
            VerificationFailure::SignatureMismatch
        })?;

        let key = self.issuer_key(vc, proof, resolution).await?;
        token.verify(&key).map_err(|e| {
            debug!("Proof signature rejected: {}", e);
            VerificationFailure::SignatureMismatch
        })?;

        let claims: CredentialClaims = token.claims().map_err(|e| {
            debug!("Proof payload is not credential claims: {}", e);
            VerificationFailure::ContentMismatch
        })?;
        if claims_describe(&claims, vc) {
            Ok(())
        } else {
            Err(VerificationFailure::ContentMismatch)
        }
    }

    async fn issuer_key(
        &self,
        vc: &VerifiableCredential,
        proof: &Proof,
        resolution: &mut Option<IssuerResolution>,
    ) -> Result<VerifyingKey, VerificationFailure> {
        if let Some(key) = self.trusted.key_for(&vc.issuer) {
            *resolution = Some(IssuerResolution::Trusted);
            return Ok(*key);
        }

        let document = match self.resolver.resolve(&vc.issuer).await {
            Resolution::Resolved(document) => {
                *resolution = Some(IssuerResolution::Resolved);
                document
            }
            Resolution::Synthesized { document, cause } => {
                debug!("Issuer {} unresolved: {}", vc.issuer, cause);
                *resolution = Some(IssuerResolution::Synthesized);
                document
            }
        };

        let method = document
            .assertion_key(&proof.verification_method)
            .ok_or_else(|| {
                debug!(
                    "{} is not an assertion method of {}",
                    proof.verification_method, document.id
                );
                VerificationFailure::SignatureMismatch
            })?;
        let public_key_hex = method
            .public_key_hex
            .as_deref()
            .ok_or(VerificationFailure::SignatureMismatch)?;
        parse_public_key_hex(public_key_hex).map_err(|e| {
            debug!("Unusable key {}: {}", method.id, e);
            VerificationFailure::SignatureMismatch
        })
    }
}

/// Whether `proof.verificationMethod` is a fragment of the issuer DID.
fn names_issuer_key(proof: &Proof, issuer: &str) -> bool {
    proof
        .verification_method
        .strip_prefix(issuer)
        .and_then(|rest| rest.strip_prefix('#'))
        .is_some_and(|fragment| !fragment.is_empty())
}

/// Whether JWT claims describe exactly this credential.
fn claims_describe(claims: &CredentialClaims, vc: &VerifiableCredential) -> bool {
    let expected = vc.claims();
    if claims.iss != expected.iss || claims.sub != expected.sub || claims.nbf != expected.nbf {
        return false;
    }
    match (to_canonical_string(&claims.vc), to_canonical_string(&expected.vc)) {
        (Ok(signed), Ok(presented)) => signed == presented,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolverError;
    use crate::models::credential::ContractData;
    use crate::models::did::{Did, DidDocument};
    use crate::services::credential_issuer::CredentialIssuer;
    use crate::services::did_resolver::{synthetic_document, DidLookup};
    use crate::wallet::key_management::KeyManager;
    use async_trait::async_trait;
    use std::sync::Arc;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    struct Offline;

    #[async_trait]
    impl DidLookup for Offline {
        async fn lookup(&self, _did: &Did) -> Result<DidDocument, ResolverError> {
            Err(ResolverError::Http("offline".into()))
        }
    }

    /// Serves a document publishing `key` under `<did>#controller`.
    struct Publishing(KeyManager);

    #[async_trait]
    impl DidLookup for Publishing {
        async fn lookup(&self, did: &Did) -> Result<DidDocument, ResolverError> {
            let mut document = synthetic_document(did.as_str());
            document.verification_method[0].public_key_hex = Some(self.0.public_key_hex());
            Ok(document)
        }
    }

    fn key() -> KeyManager {
        KeyManager::from_hex(KEY).unwrap()
    }

    fn trusting_verifier() -> Verifier {
        let key = key();
        Verifier::new(DidResolver::with_lookup(Arc::new(Offline)))
            .with_trusted_issuers(TrustedIssuers::new().with_key(key.ethr_did(), *key.verifying_key()))
    }

    async fn signed_credential() -> VerifiableCredential {
        let key = key();
        CredentialIssuer::with_signer(key.ethr_did(), Arc::new(key))
            .issue(&ContractData::new("c1", ["Acme", "Beta"]), "Qm123", None)
            .await
            .into_credential()
    }

    /// Replaces one character inside the signature segment.
    fn mutate_signature(token: &str) -> String {
        let position = token.rfind('.').unwrap() + 10;
        let mut chars: Vec<char> = token.chars().collect();
        chars[position] = if chars[position] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[tokio::test]
    async fn test_signed_credential_is_valid() {
        let _ = env_logger::builder().is_test(true).try_init();
        let vc = signed_credential().await;
        assert_eq!(
            trusting_verifier().verify(&vc).await,
            VerificationResult::valid().with_issuer_resolution(Some(IssuerResolution::Trusted))
        );
    }

    #[tokio::test]
    async fn test_unsigned_credential() {
        let mut vc = signed_credential().await;
        vc.proof = None;
        let result = trusting_verifier().verify(&vc).await;
        assert_eq!(result, VerificationResult::invalid(VerificationFailure::Unsigned));
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            serde_json::json!({"valid": false, "reason": "unsigned"})
        );
    }

    #[tokio::test]
    async fn test_single_character_mutation() {
        let mut vc = signed_credential().await;
        if let Some(proof) = vc.proof.as_mut() {
            proof.jwt = mutate_signature(&proof.jwt);
        }
        assert_eq!(
            trusting_verifier().verify(&vc).await.reason,
            Some(VerificationFailure::SignatureMismatch)
        );
    }

    #[tokio::test]
    async fn test_payload_mutation() {
        let mut vc = signed_credential().await;
        if let Some(proof) = vc.proof.as_mut() {
            let mut chars: Vec<char> = proof.jwt.chars().collect();
            let position = proof.jwt.find('.').unwrap() + 5;
            chars[position] = if chars[position] == 'A' { 'B' } else { 'A' };
            proof.jwt = chars.into_iter().collect();
        }
        assert_eq!(
            trusting_verifier().verify(&vc).await.reason,
            Some(VerificationFailure::SignatureMismatch)
        );
    }

    #[tokio::test]
    async fn test_tampered_subject_with_genuine_token() {
        let mut vc = signed_credential().await;
        vc.credential_subject.ipfs_cid = "QmForged".into();
        assert_eq!(
            trusting_verifier().verify(&vc).await.reason,
            Some(VerificationFailure::ContentMismatch)
        );
    }

    #[tokio::test]
    async fn test_backdated_issuance_with_genuine_token() {
        let mut vc = signed_credential().await;
        vc.issuance_date = vc.issuance_date - chrono::Duration::days(3650);
        assert_eq!(
            trusting_verifier().verify(&vc).await.reason,
            Some(VerificationFailure::ContentMismatch)
        );
    }

    #[tokio::test]
    async fn test_proof_naming_another_did() {
        let mut vc = signed_credential().await;
        if let Some(proof) = vc.proof.as_mut() {
            proof.verification_method =
                "did:ethr:0x0000000000000000000000000000000000000001#controller".into();
        }
        assert_eq!(
            trusting_verifier().verify(&vc).await.reason,
            Some(VerificationFailure::SignatureMismatch)
        );
    }

    #[tokio::test]
    async fn test_resolved_issuer_key() {
        let vc = signed_credential().await;
        let verifier = Verifier::new(DidResolver::with_lookup(Arc::new(Publishing(key()))));
        let result = verifier.verify(&vc).await;
        assert!(result.valid);
        assert_eq!(result.issuer_resolution, Some(IssuerResolution::Resolved));
    }

    #[tokio::test]
    async fn test_resolved_document_with_other_key() {
        let vc = signed_credential().await;
        let verifier =
            Verifier::new(DidResolver::with_lookup(Arc::new(Publishing(KeyManager::generate()))));
        assert_eq!(
            verifier.verify(&vc).await.reason,
            Some(VerificationFailure::SignatureMismatch)
        );
    }

    #[tokio::test]
    async fn test_synthesized_issuer_document_never_verifies() {
        let vc = signed_credential().await;
        let verifier = Verifier::new(DidResolver::with_lookup(Arc::new(Offline)));
        let result = verifier.verify(&vc).await;
        assert_eq!(result.reason, Some(VerificationFailure::SignatureMismatch));
        assert_eq!(result.issuer_resolution, Some(IssuerResolution::Synthesized));
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            serde_json::json!({
                "valid": false,
                "reason": "signature-mismatch",
                "issuerResolution": "synthesized"
            })
        );
    }

    #[tokio::test]
    async fn test_mutated_signature_with_resolver_offline() {
        let mut vc = signed_credential().await;
        if let Some(proof) = vc.proof.as_mut() {
            proof.jwt = mutate_signature(&proof.jwt);
        }
        let verifier = Verifier::new(DidResolver::with_lookup(Arc::new(Offline)));
        assert_eq!(
            verifier.verify(&vc).await.reason,
            Some(VerificationFailure::SignatureMismatch)
        );
    }

    #[tokio::test]
    async fn test_json_round_trip_still_verifies() {
        let vc = signed_credential().await;
        let text = serde_json::to_string(&vc).unwrap();
        let back: VerifiableCredential = serde_json::from_str(&text).unwrap();
        assert!(trusting_verifier().verify(&back).await.valid);
    }
}
