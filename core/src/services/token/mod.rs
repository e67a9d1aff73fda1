//! Token and session lifecycle
//!
//! - [`TokenCodec`] signs and verifies JWTs
//! - [`TokenIssuer`] creates sessions at login
//! - [`TokenVerifier`] authorizes access tokens against live sessions
//! - [`RotationOrchestrator`] exchanges refresh tokens
//! - [`RevocationManager`] ends sessions
//! - [`SessionReaper`] deletes expired rows
//! - [`SessionService`] ties them together

mod cleanup;
mod codec;
mod config;
mod hashing;
mod issuer;
mod revocation;
mod rotation;
mod service;
mod store;
mod verifier;

#[cfg(test)]
mod tests;

pub use cleanup::SessionReaper;
pub use codec::TokenCodec;
pub use config::TokenServiceConfig;
pub use hashing::{hash_prefix, Sha256TokenHasher, TokenHasher};
pub use issuer::TokenIssuer;
pub use revocation::RevocationManager;
pub use rotation::{RotationOrchestrator, RotationStage};
pub use service::SessionService;
pub use verifier::TokenVerifier;
