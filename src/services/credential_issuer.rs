// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Turns an extracted contract record into a contract Verifiable Credential
//! and signs it as an ES256K JWT proof.
//!
//! Issuance never fails. If the signer cannot produce a signature the
//! credential is returned without a proof as [`Issuance::Unsigned`], carrying
//! the reason, so callers have to look at the variant before treating the
//! credential as attested.

use crate::config::IssuerConfig;
use crate::error::SigningError;
use crate::models::credential::{
    BlockchainAnchor, ComplianceFlags, ContractCredentialSubject, ContractData, Party, PartyInput,
    Proof, VerifiableCredential, ASSERTION_METHOD_PURPOSE, DEFAULT_CONTRACT_TYPE,
    DEFAULT_JURISDICTION, FIRST_PARTY_ROLE, JWT_PROOF_TYPE, SECOND_PARTY_ROLE,
};
use crate::models::did::is_valid_did;
use crate::services::did_resolver::{synthesize_did, CONTROLLER_FRAGMENT};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::entropy::{EntropySource, OsEntropy};
use crate::utils::jwt;
use crate::wallet::signer::CredentialSigner;
use log::{debug, info, warn};
use std::sync::Arc;

/// DID method used for synthesized party identifiers.
const PARTY_DID_METHOD: &str = "ethr";

/// Result of an issuance.
#[derive(Debug)]
pub enum Issuance {
    /// `credential.proof` is present
    Signed(VerifiableCredential),
    /// `credential.proof` is absent because signing failed with `reason`
    Unsigned {
        credential: VerifiableCredential,
        reason: SigningError,
    },
}

impl Issuance {
    pub fn credential(&self) -> &VerifiableCredential {
        match self {
            Issuance::Signed(credential) | Issuance::Unsigned { credential, .. } => credential,
        }
    }

    pub fn into_credential(self) -> VerifiableCredential {
        match self {
            Issuance::Signed(credential) | Issuance::Unsigned { credential, .. } => credential,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Issuance::Signed(_))
    }

    /// The compact JWT, i.e. the signed form of the credential.
    pub fn token(&self) -> Option<&str> {
        match self {
            Issuance::Signed(credential) => credential.proof.as_ref().map(|proof| proof.jwt.as_str()),
            Issuance::Unsigned { .. } => None,
        }
    }
}

/// Issues contract credentials under a single issuer DID.
///
/// Cheap to clone; clones share the signer, entropy source and clock.
#[derive(Clone)]
pub struct CredentialIssuer {
    issuer_did: String,
    signer: Arc<dyn CredentialSigner>,
    entropy: Arc<dyn EntropySource>,
    clock: Arc<dyn Clock>,
}

impl CredentialIssuer {
    /// An issuer signing with the configured key reference, using OS entropy
    /// and the system clock.
    pub fn new(config: IssuerConfig) -> Self {
        Self::with_signer(config.did, Arc::new(config.key))
    }

    pub fn with_signer(issuer_did: impl Into<String>, signer: Arc<dyn CredentialSigner>) -> Self {
        Self {
            issuer_did: issuer_did.into(),
            signer,
            entropy: Arc::new(OsEntropy),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn issuer_did(&self) -> &str {
        &self.issuer_did
    }

    /// `<issuer>#controller`
    pub fn verification_method(&self) -> String {
        format!("{}#{}", self.issuer_did, CONTROLLER_FRAGMENT)
    }

    /// Issues a credential for `contract`, stored at `ipfs_cid` and
    /// optionally already anchored on chain.
    pub async fn issue(
        &self,
        contract: &ContractData,
        ipfs_cid: &str,
        anchor: Option<BlockchainAnchor>,
    ) -> Issuance {
        // The declared issuance time is taken before signing.
        let issuance_date = self.clock.now();
        let subject = self.build_subject(contract, ipfs_cid, anchor);
        let mut credential = VerifiableCredential::new(&self.issuer_did, issuance_date, subject);

        match self.sign(&credential).await {
            Ok(proof) => {
                credential.proof = Some(proof);
                info!(
                    "Issued signed credential {} for {} part(ies)",
                    credential.credential_subject.id,
                    credential.credential_subject.parties.len()
                );
                Issuance::Signed(credential)
            }
            Err(reason) => {
                warn!(
                    "Signing failed for {} ({}); returning unsigned credential",
                    credential.credential_subject.id, reason
                );
                Issuance::Unsigned { credential, reason }
            }
        }
    }

    fn build_subject(
        &self,
        contract: &ContractData,
        ipfs_cid: &str,
        anchor: Option<BlockchainAnchor>,
    ) -> ContractCredentialSubject {
        if contract.parties.is_empty() {
            warn!("Contract {} has no parties", contract.id);
        }
        let compliance_flags = contract.compliance_flags.clone().unwrap_or_else(|| {
            warn!(
                "Contract {} has no compliance flags; assuming compliant",
                contract.id
            );
            ComplianceFlags::assumed_compliant()
        });

        ContractCredentialSubject {
            id: format!("urn:uuid:{}", contract.id),
            contract_type: contract
                .contract_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTRACT_TYPE.to_string()),
            jurisdiction: contract
                .jurisdiction
                .clone()
                .unwrap_or_else(|| DEFAULT_JURISDICTION.to_string()),
            parties: contract
                .parties
                .iter()
                .enumerate()
                .map(|(index, party)| self.party(index, party))
                .collect(),
            key_terms: contract.key_terms.clone().unwrap_or_default(),
            compliance_flags,
            ipfs_cid: ipfs_cid.to_string(),
            blockchain_anchor: anchor,
            ocr_extraction: contract.ocr_results.clone().unwrap_or_default(),
        }
    }

    fn party(&self, index: usize, input: &PartyInput) -> Party {
        let did = match input.did() {
            Some(did) if is_valid_did(did) => Some(did.to_string()),
            supplied => {
                if let Some(bad) = supplied {
                    warn!("Party {} has malformed DID {:?}; replacing it", input.name(), bad);
                }
                self.party_did()
            }
        };
        Party {
            name: input.name().to_string(),
            did,
            role: if index == 0 {
                FIRST_PARTY_ROLE.to_string()
            } else {
                SECOND_PARTY_ROLE.to_string()
            },
        }
    }

    fn party_did(&self) -> Option<String> {
        match synthesize_did(PARTY_DID_METHOD, self.entropy.as_ref()) {
            Ok(did) => Some(did.into()),
            Err(e) => {
                warn!("Could not synthesize party DID: {}", e);
                None
            }
        }
    }

    async fn sign(&self, credential: &VerifiableCredential) -> Result<Proof, SigningError> {
        let input = jwt::signing_input(&credential.claims())?;
        debug!("Signing {} byte JWS input", input.len());
        let signature = self.signer.sign(input.as_bytes()).await?;
        if signature.len() != 64 {
            return Err(SigningError::Backend(format!(
                "expected a 64-byte signature, got {} bytes",
                signature.len()
            )));
        }
        Ok(Proof {
            kind: JWT_PROOF_TYPE.to_string(),
            jwt: jwt::assemble(&input, &signature),
            created: self.clock.now(),
            proof_purpose: ASSERTION_METHOD_PURPOSE.to_string(),
            verification_method: self.verification_method(),
        })
    }
}
