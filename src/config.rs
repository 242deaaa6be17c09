// src/config.rs
//! Configuration for the issuer and resolver.
//!
//! Components take these structs at construction time; nothing in the crate
//! reads global state. [`Settings::load`] is a convenience for embedding
//! applications that want the usual file + environment layering:
//!
//! - optional `contract-vc.{toml,yaml,json}` in the working directory
//! - `.env` (via `dotenv`) and `CONTRACT_VC__`-prefixed variables, with `__`
//!   separating nested keys, e.g. `CONTRACT_VC__ISSUER__DID`

use crate::error::SettingsError;
use crate::wallet::signer::KeyReference;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Issuer identity and where its key lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Example: "did:ethr:0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
    pub did: String,
    pub key: KeyReference,
}

/// A resolver endpoint serving one DID method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverEndpoint {
    /// DID method routed to this endpoint, e.g. "ethr"
    pub method: String,
    /// Base URL of a universal-resolver compatible service
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<ResolverEndpoint>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ResolverConfig {
    pub fn endpoint_for(&self, method: &str) -> Option<&ResolverEndpoint> {
        self.endpoints.iter().find(|endpoint| endpoint.method == method)
    }
}

fn default_endpoints() -> Vec<ResolverEndpoint> {
    vec![ResolverEndpoint {
        method: "ethr".to_string(),
        url: "https://dev.uniresolver.io".to_string(),
    }]
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub issuer: IssuerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Settings {
    /// Loads settings from the optional config file and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        dotenv::dotenv().ok();
        let settings = Config::builder()
            .add_source(File::with_name("contract-vc").required(false))
            .add_source(Environment::with_prefix("CONTRACT_VC").prefix_separator("__").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Parses settings from a TOML document.
    pub fn from_toml(document: &str) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
