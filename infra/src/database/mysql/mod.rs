//! MySQL repository implementations

mod session_repository_impl;
mod user_repository_impl;

pub use session_repository_impl::MySqlSessionRepository;
pub use user_repository_impl::MySqlUserRepository;

use tg_core::errors::DomainError;

/// Wrap an SQLx failure as a retryable store error
pub(crate) fn store_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::persistence(format!("{}: {}", context, e))
}

/// Wrap a column decoding failure
pub(crate) fn column_error(column: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::Internal {
        message: format!("Failed to get {}: {}", column, e),
    }
}
