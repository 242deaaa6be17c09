// src/services/did_resolver.rs
//! DID resolution with a synthetic fallback.
//!
//! [`DidResolver::resolve`] never fails. When the configured lookup cannot
//! produce a document (bad syntax, unsupported method, network or parse
//! error) the resolver builds a deterministic stand-in document from the DID
//! string and returns it as [`Resolution::Synthesized`], together with the
//! error that caused the fallback. Synthesized documents are for offline and
//! demo operation and carry no cryptographic meaning.

use crate::config::ResolverConfig;
use crate::error::ResolverError;
use crate::models::did::{Did, DidDocument, VerificationMethod};
use crate::utils::crypto::{hash_data, to_hex_prefixed};
use crate::utils::entropy::EntropySource;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Verification method type used for synthesized documents.
pub const SECP256K1_RECOVERY_METHOD: &str = "EcdsaSecp256k1RecoveryMethod2020";

/// Fragment naming the controller key of a DID.
pub const CONTROLLER_FRAGMENT: &str = "controller";

/// Fetches the DID document for a syntactically valid DID.
#[async_trait]
pub trait DidLookup: Send + Sync {
    async fn lookup(&self, did: &Did) -> Result<DidDocument, ResolverError>;
}

/// Looks DIDs up on universal-resolver compatible HTTP endpoints, one
/// endpoint per DID method.
pub struct HttpLookup {
    client: Client,
    config: ResolverConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionResponse {
    did_document: DidDocument,
}

impl HttpLookup {
    pub fn new(config: ResolverConfig) -> Result<Self, ResolverError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("contract-vc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolverError::Http(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DidLookup for HttpLookup {
    async fn lookup(&self, did: &Did) -> Result<DidDocument, ResolverError> {
        let endpoint = self
            .config
            .endpoint_for(did.method())
            .ok_or_else(|| ResolverError::UnsupportedMethod(did.method().to_string()))?;
        let url = format!("{}/1.0/identifiers/{}", endpoint.url.trim_end_matches('/'), did);
        debug!("Resolving {} via {}", did, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ResolverError::Http(format!("request to {} timed out", url))
            } else {
                ResolverError::Http(format!("request to {} failed: {}", url, e))
            }
        })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ResolverError::NotFound(did.to_string())),
            status => {
                return Err(ResolverError::Http(format!(
                    "HTTP {} when fetching {}",
                    status.as_u16(),
                    url
                )))
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ResolverError::Http(format!("failed to read body from {}: {}", url, e)))?;
        let parsed: ResolutionResponse = serde_json::from_slice(&body)?;
        Ok(parsed.did_document)
    }
}

/// Outcome of a resolution.
#[derive(Debug)]
pub enum Resolution {
    /// The lookup produced this document
    Resolved(DidDocument),
    /// The lookup failed with `cause`; `document` is a stand-in
    Synthesized {
        document: DidDocument,
        cause: ResolverError,
    },
}

impl Resolution {
    pub fn document(&self) -> &DidDocument {
        match self {
            Resolution::Resolved(document) | Resolution::Synthesized { document, .. } => document,
        }
    }

    pub fn into_document(self) -> DidDocument {
        match self {
            Resolution::Resolved(document) | Resolution::Synthesized { document, .. } => document,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, Resolution::Synthesized { .. })
    }
}

/// Resolves DIDs through a [`DidLookup`], falling back to synthetic documents.
#[derive(Clone)]
pub struct DidResolver {
    lookup: Arc<dyn DidLookup>,
}

impl DidResolver {
    /// A resolver backed by [`HttpLookup`].
    pub fn new(config: ResolverConfig) -> Result<Self, ResolverError> {
        Ok(Self::with_lookup(Arc::new(HttpLookup::new(config)?)))
    }

    pub fn with_lookup(lookup: Arc<dyn DidLookup>) -> Self {
        Self { lookup }
    }

    /// Resolves `did`. Performs at most one lookup and never fails.
    pub async fn resolve(&self, did: &str) -> Resolution {
        let parsed = match Did::parse(did) {
            Ok(parsed) => parsed,
            Err(cause) => return synthesized(did, cause),
        };
        match self.lookup.lookup(&parsed).await {
            Ok(document) => {
                debug!("Resolved {}", did);
                Resolution::Resolved(document)
            }
            Err(cause) => synthesized(did, cause),
        }
    }
}

fn synthesized(did: &str, cause: ResolverError) -> Resolution {
    warn!("Resolution of {} failed ({}); using synthetic document", did, cause);
    Resolution::Synthesized {
        document: synthetic_document(did),
        cause,
    }
}

/// The stand-in document for `did`.
///
/// One `EcdsaSecp256k1RecoveryMethod2020` method `<did>#controller`, referenced
/// by `authentication` and `assertionMethod`. Its `publicKeyHex` is the
/// Keccak-256 of the DID string, which is stable but is not a curve point.
pub fn synthetic_document(did: &str) -> DidDocument {
    let method_id = format!("{}#{}", did, CONTROLLER_FRAGMENT);
    DidDocument {
        id: did.to_string(),
        verification_method: vec![VerificationMethod {
            id: method_id.clone(),
            kind: SECP256K1_RECOVERY_METHOD.to_string(),
            controller: did.to_string(),
            public_key_hex: Some(to_hex_prefixed(&hash_data(did.as_bytes()))),
        }],
        authentication: vec![method_id.clone()],
        assertion_method: vec![method_id],
        key_agreement: vec![],
    }
}

/// Mints a random DID `did:<method>:0x<40 hex>` from 160 bits of entropy.
///
/// The result is a placeholder, not a binding to any real identity.
pub fn synthesize_did(method: &str, entropy: &dyn EntropySource) -> Result<Did, ResolverError> {
    let mut identifier = [0u8; 20];
    entropy.fill_bytes(&mut identifier);
    Did::parse(&format!("did:{}:{}", method, to_hex_prefixed(&identifier)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverEndpoint;
    use crate::utils::entropy::SeededEntropy;
    use mockall::mock;

    mock! {
        pub Lookup {}
        #[async_trait]
        impl DidLookup for Lookup {
            async fn lookup(&self, did: &Did) -> Result<DidDocument, ResolverError>;
        }
    }

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[tokio::test]
    async fn test_resolved_document_is_passed_through() {
        init_logs();
        let mut lookup = MockLookup::new();
        lookup
            .expect_lookup()
            .times(1)
            .returning(|did| {
                let mut document = synthetic_document(did.as_str());
                document.key_agreement.push(format!("{}#x25519", did));
                Ok(document)
            });
        let resolver = DidResolver::with_lookup(Arc::new(lookup));

        let resolution = resolver.resolve("did:ethr:0xabc123").await;
        assert!(!resolution.is_synthesized());
        assert_eq!(resolution.document().key_agreement, vec!["did:ethr:0xabc123#x25519"]);
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back() {
        init_logs();
        let mut lookup = MockLookup::new();
        lookup
            .expect_lookup()
            .times(2)
            .returning(|_| Err(ResolverError::Http("connection refused".into())));
        let resolver = DidResolver::with_lookup(Arc::new(lookup));

        let first = resolver.resolve("did:ethr:0xabc123").await;
        let second = resolver.resolve("did:ethr:0xabc123").await;
        match &first {
            Resolution::Synthesized { cause, document } => {
                assert!(matches!(cause, ResolverError::Http(_)));
                assert_eq!(document.id, "did:ethr:0xabc123");
            }
            other => panic!("expected synthesized document, got {:?}", other),
        }
        assert_eq!(first.into_document(), second.into_document());
    }

    #[tokio::test]
    async fn test_invalid_did_skips_lookup() {
        let mut lookup = MockLookup::new();
        lookup.expect_lookup().times(0);
        let resolver = DidResolver::with_lookup(Arc::new(lookup));

        let resolution = resolver.resolve("not-a-did").await;
        assert!(matches!(
            resolution,
            Resolution::Synthesized { cause: ResolverError::InvalidDid(_), .. }
        ));
        assert_eq!(resolution.document().id, "not-a-did");
    }

    #[test]
    fn test_synthetic_document_shape() {
        let document = synthetic_document("did:ethr:0xabc123");
        let method = &document.verification_method[0];
        assert_eq!(document.verification_method.len(), 1);
        assert_eq!(method.id, "did:ethr:0xabc123#controller");
        assert_eq!(method.kind, "EcdsaSecp256k1RecoveryMethod2020");
        assert_eq!(method.controller, "did:ethr:0xabc123");
        assert_eq!(method.public_key_hex.as_ref().map(String::len), Some(66));
        assert_eq!(document.authentication, vec![method.id.clone()]);
        assert_eq!(document.assertion_method, vec![method.id.clone()]);
        assert!(document.key_agreement.is_empty());
    }

    #[tokio::test]
    async fn test_http_lookup_rejects_unconfigured_method() {
        let lookup = HttpLookup::new(ResolverConfig {
            endpoints: vec![ResolverEndpoint {
                method: "web".into(),
                url: "http://127.0.0.1:9".into(),
            }],
            timeout_secs: 1,
        })
        .unwrap();
        let did = Did::parse("did:ethr:0xabc123").unwrap();
        assert!(matches!(
            lookup.lookup(&did).await,
            Err(ResolverError::UnsupportedMethod(method)) if method == "ethr"
        ));
    }

    #[test]
    fn test_synthesize_did_is_seeded() {
        let a = synthesize_did("ethr", &SeededEntropy::new(42)).unwrap();
        let b = synthesize_did("ethr", &SeededEntropy::new(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.method(), "ethr");
        assert_eq!(a.method_specific_id().len(), 42);
        assert!(a.method_specific_id().starts_with("0x"));

        let key = synthesize_did("key", &SeededEntropy::new(42)).unwrap();
        assert_eq!(key.method(), "key");
    }

    #[test]
    fn test_synthesize_did_rejects_bad_method() {
        assert!(synthesize_did("ETHR", &SeededEntropy::new(1)).is_err());
    }
}
