pub mod credential_issuer;
pub mod did_resolver;
pub mod hasher;
pub mod verifier;
