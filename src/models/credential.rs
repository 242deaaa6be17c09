// src/models/credential.rs
//! Contract Verifiable Credential data model.
//!
//! Defines the W3C [Verifiable Credentials](https://www.w3.org/TR/vc-data-model/)
//! envelope used for ASEAN cross-border contracts, the contract-specific
//! credential subject, the embedded JWT proof, and the raw contract record
//! accepted from the upstream extraction pipeline.
//!
//! JSON field names follow the JSON-LD form (`@context`, `issuanceDate`,
//! `credentialSubject`, ...). Absent optional fields are omitted, never
//! written as `null`.

use crate::utils::clock::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const VC_CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";
pub const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const ASEAN_CONTRACT_CONTEXT: &str = "https://schema.asean.org/contract/v1";

pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";
pub const ASEAN_CONTRACT_CREDENTIAL_TYPE: &str = "ASEANContractCredential";

pub const JWT_PROOF_TYPE: &str = "JwtProof2020";
pub const ASSERTION_METHOD_PURPOSE: &str = "assertionMethod";

pub const DEFAULT_CONTRACT_TYPE: &str = "Supply Agreement";
pub const DEFAULT_JURISDICTION: &str = "ASEAN Cross-Border";
pub const DEFAULT_QUALITY_STANDARD: &str = "ISO 9001";

/// Role of the first party in a contract.
pub const FIRST_PARTY_ROLE: &str = "supplier";
/// Role of every party after the first.
pub const SECOND_PARTY_ROLE: &str = "buyer";

/// Contract record as produced by the extraction pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractData {
    /// Becomes `urn:uuid:<id>` in the credential subject
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,

    #[serde(default)]
    pub parties: Vec<PartyInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_terms: Option<KeyTerms>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_flags: Option<ComplianceFlags>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_results: Option<Vec<String>>,
}

impl ContractData {
    /// A record with only an id and party names.
    pub fn new<I, S>(id: impl Into<String>, parties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            parties: parties
                .into_iter()
                .map(|name| PartyInput::Name(name.into()))
                .collect(),
            ..Default::default()
        }
    }
}

/// A party as supplied by the caller: a bare display name, or a name with an
/// already-known DID.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PartyInput {
    Name(String),
    Identified {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        did: Option<String>,
    },
}

impl PartyInput {
    pub fn name(&self) -> &str {
        match self {
            PartyInput::Name(name) | PartyInput::Identified { name, .. } => name,
        }
    }

    pub fn did(&self) -> Option<&str> {
        match self {
            PartyInput::Name(_) => None,
            PartyInput::Identified { did, .. } => did.as_deref(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceFlags {
    #[serde(rename = "aseanFTA")]
    pub asean_fta: bool,
    pub export_license: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_standards: Option<String>,
}

impl ComplianceFlags {
    /// The flags attached when the caller supplies none. This asserts
    /// compliance without evidence; issuance logs a warning when it happens.
    pub fn assumed_compliant() -> Self {
        Self {
            asean_fta: true,
            export_license: true,
            quality_standards: Some(DEFAULT_QUALITY_STANDARD.to_string()),
        }
    }
}

/// On-chain anchor reported by the submission collaborator.
///
/// All three fields are required, so a partial anchor cannot be represented.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainAnchor {
    pub transaction_hash: String,
    pub block_number: u64,
    pub network: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractCredentialSubject {
    /// Example: "urn:uuid:c1"
    pub id: String,
    pub contract_type: String,
    pub jurisdiction: String,
    /// Input order, first party is the supplier
    pub parties: Vec<Party>,
    #[serde(default)]
    pub key_terms: KeyTerms,
    pub compliance_flags: ComplianceFlags,
    #[serde(rename = "ipfsCID")]
    pub ipfs_cid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain_anchor: Option<BlockchainAnchor>,
    /// Raw OCR text, opaque
    #[serde(default)]
    pub ocr_extraction: Vec<String>,
}

/// Embedded JWT proof.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Always "JwtProof2020"
    #[serde(rename = "type")]
    pub kind: String,

    /// Compact ES256K JWS over the credential claims
    pub jwt: String,

    #[serde(with = "timestamp")]
    pub created: DateTime<Utc>,

    /// Always "assertionMethod"
    pub proof_purpose: String,

    /// Example: "did:ethr:0xabc#controller"
    pub verification_method: String,
}

/// Whether a credential carries a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attestation<'a> {
    Signed(&'a Proof),
    Unsigned,
}

/// A contract Verifiable Credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    #[serde(rename = "type")]
    pub kind: Vec<String>,

    /// Issuer DID
    pub issuer: String,

    /// Fixed at creation
    #[serde(with = "timestamp")]
    pub issuance_date: DateTime<Utc>,

    pub credential_subject: ContractCredentialSubject,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiableCredential {
    /// An unsigned credential with the fixed contract context and types.
    pub fn new(
        issuer: impl Into<String>,
        issuance_date: DateTime<Utc>,
        credential_subject: ContractCredentialSubject,
    ) -> Self {
        Self {
            context: default_context(),
            kind: default_types(),
            issuer: issuer.into(),
            issuance_date,
            credential_subject,
            proof: None,
        }
    }

    pub fn attestation(&self) -> Attestation<'_> {
        match &self.proof {
            Some(proof) => Attestation::Signed(proof),
            None => Attestation::Unsigned,
        }
    }

    /// The claims a JWT proof for this credential carries.
    pub fn claims(&self) -> CredentialClaims {
        CredentialClaims {
            iss: self.issuer.clone(),
            sub: self.credential_subject.id.clone(),
            nbf: self.issuance_date.timestamp(),
            vc: CredentialBody {
                context: self.context.clone(),
                kind: self.kind.clone(),
                credential_subject: self.credential_subject.clone(),
            },
        }
    }
}

pub fn default_context() -> Vec<String> {
    vec![
        VC_CONTEXT_V1.to_string(),
        ED25519_2020_CONTEXT.to_string(),
        ASEAN_CONTRACT_CONTEXT.to_string(),
    ]
}

pub fn default_types() -> Vec<String> {
    vec![
        VERIFIABLE_CREDENTIAL_TYPE.to_string(),
        ASEAN_CONTRACT_CREDENTIAL_TYPE.to_string(),
    ]
}

/// JWT payload of a credential proof.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialClaims {
    pub iss: String,
    pub sub: String,
    /// Issuance time, unix seconds
    pub nbf: i64,
    pub vc: CredentialBody,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBody {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Vec<String>,
    pub credential_subject: ContractCredentialSubject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn subject() -> ContractCredentialSubject {
        ContractCredentialSubject {
            id: "urn:uuid:c1".into(),
            contract_type: DEFAULT_CONTRACT_TYPE.into(),
            jurisdiction: DEFAULT_JURISDICTION.into(),
            parties: vec![Party {
                name: "Acme".into(),
                did: Some("did:ethr:0x01".into()),
                role: FIRST_PARTY_ROLE.into(),
            }],
            key_terms: KeyTerms::default(),
            compliance_flags: ComplianceFlags::assumed_compliant(),
            ipfs_cid: "Qm123".into(),
            blockchain_anchor: None,
            ocr_extraction: vec![],
        }
    }

    #[test]
    fn test_credential_json_ld_shape() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let vc = VerifiableCredential::new("did:ethr:0xissuer", issued, subject());
        let value = serde_json::to_value(&vc).unwrap();

        assert_eq!(value["@context"][0], VC_CONTEXT_V1);
        assert_eq!(value["type"], json!(["VerifiableCredential", "ASEANContractCredential"]));
        assert_eq!(value["issuanceDate"], "2024-05-01T08:30:00.000Z");
        assert_eq!(value["credentialSubject"]["ipfsCID"], "Qm123");
        assert_eq!(value["credentialSubject"]["keyTerms"], json!({}));
        assert_eq!(value["credentialSubject"]["complianceFlags"]["aseanFTA"], true);
        assert!(value["credentialSubject"].get("blockchainAnchor").is_none());
        assert!(value.get("proof").is_none());
        assert_eq!(vc.attestation(), Attestation::Unsigned);
    }

    #[test]
    fn test_contract_data_accepts_mixed_parties() {
        let data: ContractData = serde_json::from_value(json!({
            "id": "c9",
            "parties": ["Acme", {"name": "Beta", "did": "did:ethr:0xbeta"}],
            "ocrResults": ["line one"]
        }))
        .unwrap();
        assert_eq!(data.parties[0], PartyInput::Name("Acme".into()));
        assert_eq!(data.parties[1].name(), "Beta");
        assert_eq!(data.parties[1].did(), Some("did:ethr:0xbeta"));
        assert_eq!(data.ocr_results.as_deref(), Some(&["line one".to_string()][..]));
    }

    #[test]
    fn test_anchor_must_be_complete() {
        let partial = json!({"transactionHash": "0xabc", "network": "mainnet"});
        assert!(serde_json::from_value::<BlockchainAnchor>(partial).is_err());
    }

    #[test]
    fn test_claims_mirror_credential() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let vc = VerifiableCredential::new("did:ethr:0xissuer", issued, subject());
        let claims = serde_json::to_value(vc.claims()).unwrap();
        assert_eq!(claims["iss"], "did:ethr:0xissuer");
        assert_eq!(claims["sub"], "urn:uuid:c1");
        assert_eq!(claims["nbf"], Value::from(issued.timestamp()));
        assert_eq!(claims["vc"]["credentialSubject"]["parties"][0]["role"], "supplier");
    }
}
