//! Unit tests for domain error types

use tg_shared::ConfigError;

use crate::errors::{AuthError, DomainError, TokenError};

#[test]
fn test_retryable_classification() {
    assert!(DomainError::persistence("connection reset").is_retryable());
    assert!(DomainError::StoreTimeout {
        operation: "create".to_string(),
        timeout_ms: 5000,
    }
    .is_retryable());

    assert!(!DomainError::Token(TokenError::Expired).is_retryable());
    assert!(!DomainError::Auth(AuthError::SessionNotFound).is_retryable());
}

#[test]
fn test_authentication_failure_classification() {
    assert!(DomainError::from(TokenError::InvalidSignature).is_authentication_failure());
    assert!(DomainError::from(AuthError::UserInactive).is_authentication_failure());
    assert!(!DomainError::persistence("down").is_authentication_failure());
    assert!(!DomainError::from(TokenError::EncodingFailed).is_authentication_failure());
    assert!(!DomainError::Internal {
        message: "boom".to_string()
    }
    .is_authentication_failure());
}

#[test]
fn test_config_error_conversion() {
    let err: DomainError = ConfigError::missing("JWT_ACCESS_SECRET").into();
    match err {
        DomainError::Config { message } => assert!(message.contains("JWT_ACCESS_SECRET")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_type_mismatch_message() {
    let err = TokenError::TypeMismatch {
        expected: "access".to_string(),
        actual: "refresh".to_string(),
    };
    assert_eq!(err.to_string(), "Token type mismatch: expected access, got refresh");
}
