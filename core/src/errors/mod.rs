//! Domain-specific error types and error handling.

mod types;

#[cfg(test)]
mod tests;

pub use types::{AuthError, TokenError};

use thiserror::Error;
use tg_shared::ConfigError;

/// Core domain errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Required configuration absent or invalid; fatal at startup
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Session store failure; the caller may retry
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Session store call exceeded its time budget
    #[error("Session store timed out during {operation} after {timeout_ms}ms")]
    StoreTimeout { operation: String, timeout_ms: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Wrap a store failure
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Whether the caller should retry rather than force a re-login
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::StoreTimeout { .. })
    }

    /// Whether this is an authentication failure (bad token, dead session, inactive user)
    ///
    /// `EncodingFailed` is an internal signing failure and is excluded.
    pub fn is_authentication_failure(&self) -> bool {
        match self {
            Self::Auth(_) => true,
            Self::Token(TokenError::EncodingFailed) => false,
            Self::Token(_) => true,
            _ => false,
        }
    }
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
