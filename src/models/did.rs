// src/models/did.rs
//! Decentralized Identifier (DID) data model.
//!
//! Follows the shape of a [DID Core](https://www.w3.org/TR/did-core/) document
//! as far as credential signing and verification need it: verification
//! methods with hex public keys and the three relationships that reference
//! them by id.

use crate::error::ResolverError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Checks the syntactic shape `did:<method>:<identifier>`.
///
/// `method` is one or more lowercase ASCII letters or digits; `identifier` is
/// one or more ASCII letters, digits, `.`, `_` or `-`. No I/O.
pub fn is_valid_did(candidate: &str) -> bool {
    let Some(rest) = candidate.strip_prefix("did:") else {
        return false;
    };
    let Some((method, identifier)) = rest.split_once(':') else {
        return false;
    };
    !method.is_empty()
        && method
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && !identifier.is_empty()
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// A syntactically valid DID.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    pub fn parse(candidate: &str) -> Result<Self, ResolverError> {
        if is_valid_did(candidate) {
            Ok(Did(candidate.to_string()))
        } else {
            Err(ResolverError::InvalidDid(candidate.to_string()))
        }
    }

    /// The method token, e.g. `ethr`.
    pub fn method(&self) -> &str {
        self.0["did:".len()..].split(':').next().unwrap_or_default()
    }

    /// Everything after the method token.
    pub fn method_specific_id(&self) -> &str {
        let start = "did:".len() + self.method().len() + 1;
        &self.0[start..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<did>#<fragment>`
    pub fn with_fragment(&self, fragment: &str) -> String {
        format!("{}#{}", self.0, fragment)
    }
}

impl FromStr for Did {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Did::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = ResolverError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Did::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key listed in a DID document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Example: "did:ethr:0xabc#controller"
    pub id: String,

    /// Example: "EcdsaSecp256k1RecoveryMethod2020"
    #[serde(rename = "type")]
    pub kind: String,

    pub controller: String,

    /// SEC1 public key bytes, hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,
}

/// A resolved DID document.
///
/// Recomputed on every resolution and never cached.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<String>,
}

impl DidDocument {
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|method| method.id == id)
    }

    /// The method with the given id, provided the document also lists it
    /// under `assertionMethod`.
    pub fn assertion_key(&self, id: &str) -> Option<&VerificationMethod> {
        if self.assertion_method.iter().any(|reference| reference == id) {
            self.verification_method(id)
        } else {
            None
        }
    }
}
