//! # Tollgate Core
//!
//! Token and session lifecycle engine: JWT access/refresh issuance backed by
//! server-side sessions, verification, rotation, revocation and cleanup.
//! Persistence and user lookup are reached through repository traits.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod errors;

// Re-export commonly used types for convenience
pub use domain::*;
pub use services::*;
pub use repositories::*;
pub use errors::*;
