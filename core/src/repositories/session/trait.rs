//! Session repository trait defining the interface for session persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::session::{RevocationReason, Session, SessionSelector, SessionSummary};
use crate::errors::DomainError;

/// New identity and hashes written by a rotating refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRotation {
    pub new_session_id: String,
    pub new_access_hash: String,
    pub new_refresh_hash: String,
    pub new_expires_at: DateTime<Utc>,
}

/// Repository trait for Session persistence operations
///
/// The store is the single source of truth for whether a token is still
/// valid. Every lookup used for authorization filters on
/// `is_revoked = false AND expires_at >= now`; a row failing that filter is
/// treated as if it did not exist.
///
/// # Security Considerations
/// - Only token hashes are stored, never raw tokens
/// - `replace` and `update_access_hash` are conditional on the refresh hash
///   still being current, so two racing refreshes cannot both win
/// - Revocation is terminal
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session
    ///
    /// # Returns
    /// * `Ok(String)` - The session id
    /// * `Err(DomainError)` - Save failed (e.g., duplicate session id or token hash)
    async fn create(&self, session: Session) -> Result<String, DomainError>;

    /// Find a session by id regardless of liveness
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>, DomainError>;

    /// Find the live session owned by `user_id` whose current access hash is `access_hash`
    async fn find_by_user_and_access_hash(
        &self,
        user_id: Uuid,
        access_hash: &str,
    ) -> Result<Option<Session>, DomainError>;

    /// Find the live session owned by `user_id` whose current refresh hash is `refresh_hash`
    async fn find_by_user_and_refresh_hash(
        &self,
        user_id: Uuid,
        refresh_hash: &str,
    ) -> Result<Option<Session>, DomainError>;

    /// Stamp `last_activity = now` on a live session
    ///
    /// # Returns
    /// * `Ok(true)` - Session updated
    /// * `Ok(false)` - No live session with that id
    async fn touch_activity(&self, session_id: &str) -> Result<bool, DomainError>;

    /// Atomically swap a session's identity and token hashes
    ///
    /// Succeeds only if the session is live and its refresh hash still equals
    /// `expected_refresh_hash`. A `false` result means another refresh got
    /// there first (or the session died) and nothing was written.
    async fn replace(
        &self,
        session_id: &str,
        expected_refresh_hash: &str,
        rotation: SessionRotation,
    ) -> Result<bool, DomainError>;

    /// Record a new access hash without touching the session identity or refresh hash
    ///
    /// Same conditional semantics as [`SessionRepository::replace`]; also stamps `last_activity`.
    async fn update_access_hash(
        &self,
        session_id: &str,
        expected_refresh_hash: &str,
        new_access_hash: &str,
    ) -> Result<bool, DomainError>;

    /// Revoke sessions matching `selector`
    ///
    /// Already-revoked rows keep their original `revoked_at` / `revoked_reason`.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows matched, including rows that were already revoked
    async fn revoke(
        &self,
        selector: &SessionSelector,
        reason: &RevocationReason,
    ) -> Result<usize, DomainError>;

    /// Revoke every live session of a user, optionally sparing one device
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of sessions newly revoked
    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_device_id: Option<&str>,
        reason: &RevocationReason,
    ) -> Result<usize, DomainError>;

    /// Delete rows with `expires_at < now`, revoked or not
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows deleted
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;

    /// List a user's live sessions, most recently active first
    async fn list_active(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, DomainError>;

    /// Count a user's live sessions
    async fn count_active(&self, user_id: Uuid) -> Result<usize, DomainError> {
        Ok(self.list_active(user_id).await?.len())
    }
}
