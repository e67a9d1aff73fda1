//! Error types for token handling and session authentication
//!
//! Variants carry the precise internal reason for logging. Callers that face
//! clients must collapse all of them into one generic "unauthenticated" outcome.

use thiserror::Error;

/// Token codec errors (cryptographic and structural)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signature verification failed")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token issuer mismatch")]
    IssuerMismatch,

    #[error("Malformed token")]
    Malformed,

    #[error("Token type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Token encoding failed")]
    EncodingFailed,
}

/// Session and principal liveness errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No live session matches the presented token")]
    SessionNotFound,

    #[error("Session expired or revoked")]
    SessionExpiredOrRevoked,

    #[error("User not found")]
    UserNotFound,

    #[error("User account is inactive")]
    UserInactive,

    #[error("Session was rotated concurrently")]
    RotationConflict,
}
