// src/lib.rs

//! # Contract Credentials - Issuance and Anchoring Core
//!
//! Builds, signs, fingerprints and verifies W3C Verifiable Credentials for
//! ASEAN cross-border contracts.
//!
//! ## Architecture Overview
//! 1. **DID Resolver**: [`DidResolver`] looks DID documents up through a
//!    pluggable [`DidLookup`] and falls back to a deterministic synthetic
//!    document, reported as [`Resolution::Synthesized`]
//! 2. **Credential Issuer**: [`CredentialIssuer`] turns a [`ContractData`]
//!    record into a credential with an ES256K JWT proof, or an unsigned one
//!    when signing fails ([`Issuance`])
//! 3. **Hasher / Verifier**: [`fingerprint`] for anchoring and [`Verifier`]
//!    for proof checks
//!
//! No operation returns an error to its caller: degraded outcomes are
//! variants (`Resolution::Synthesized`, `Issuance::Unsigned`,
//! `VerificationResult { valid: false, .. }`) that callers must inspect.
//! Nothing here provides real assurance on its own; a synthesized document or
//! a defaulted compliance flag is demo-grade data.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod wallet;

pub use crate::config::{IssuerConfig, ResolverConfig, ResolverEndpoint, Settings};
pub use error::{ResolverError, SettingsError, SigningError, TokenError};
pub use models::credential::{
    Attestation, BlockchainAnchor, ComplianceFlags, ContractCredentialSubject, ContractData,
    KeyTerms, Party, PartyInput, Proof, VerifiableCredential,
};
pub use models::did::{is_valid_did, Did, DidDocument, VerificationMethod};
pub use services::credential_issuer::{CredentialIssuer, Issuance};
pub use services::did_resolver::{
    synthesize_did, synthetic_document, DidLookup, DidResolver, HttpLookup, Resolution,
};
pub use services::hasher::{content_digest, fingerprint};
pub use services::verifier::{
    IssuerResolution, TrustedIssuers, VerificationFailure, VerificationResult, Verifier,
};
pub use utils::clock::{Clock, FixedClock, SystemClock};
pub use utils::entropy::{EntropySource, OsEntropy, SeededEntropy};
pub use wallet::key_management::KeyManager;
pub use wallet::signer::{CredentialSigner, KeyReference};
