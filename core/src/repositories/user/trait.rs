//! User lookup port used when authorizing tokens.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

/// Repository trait for resolving the owner of a token
///
/// Account management lives elsewhere; the session engine only needs to know
/// whether a user still exists and is active.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their unique identifier
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user with that id
    /// * `Err(DomainError)` - Database or other error occurred
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DomainError>;
}
