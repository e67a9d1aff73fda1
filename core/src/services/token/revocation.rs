//! Logical session termination

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::session::{RevocationReason, SessionSelector};
use crate::errors::DomainError;
use crate::repositories::SessionRepository;

use super::config::TokenServiceConfig;
use super::hashing::{hash_prefix, TokenHasher};
use super::store::bounded;

pub struct RevocationManager<S: SessionRepository> {
    sessions: Arc<S>,
    hasher: Arc<dyn TokenHasher>,
    config: Arc<TokenServiceConfig>,
}

impl<S: SessionRepository> RevocationManager<S> {
    pub fn new(sessions: Arc<S>, hasher: Arc<dyn TokenHasher>, config: Arc<TokenServiceConfig>) -> Self {
        Self {
            sessions,
            hasher,
            config,
        }
    }

    /// Revoke by session id, falling back to token hash or device id
    ///
    /// Idempotent: a session that is already revoked still counts as a match.
    ///
    /// # Returns
    /// * `Ok(true)` - At least one session matched
    /// * `Ok(false)` - Nothing matched the identifier
    pub async fn revoke(&self, identifier: &str, reason: &RevocationReason) -> Result<bool, DomainError> {
        let by_id = SessionSelector::SessionId(identifier.to_string());
        let mut matched = self.revoke_selector(&by_id, reason).await?;

        if matched == 0 {
            let by_hash_or_device = SessionSelector::TokenHashOrDevice(identifier.to_string());
            matched = self.revoke_selector(&by_hash_or_device, reason).await?;
        }

        if matched == 0 {
            debug!(reason = %reason, "Revocation matched no session");
        }
        Ok(matched > 0)
    }

    /// Revoke the session a raw access or refresh token belongs to
    pub async fn revoke_token(&self, token: &str, reason: &RevocationReason) -> Result<bool, DomainError> {
        let hash = self.hasher.hash(token);
        let selector = SessionSelector::TokenHashOrDevice(hash.clone());
        let matched = self.revoke_selector(&selector, reason).await?;
        debug!(token_hash = hash_prefix(&hash), matched, "Token revocation");
        Ok(matched > 0)
    }

    /// Revoke every live session of a user, optionally sparing one device
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_device_id: Option<&str>,
        reason: &RevocationReason,
    ) -> Result<usize, DomainError> {
        let call = self.sessions.revoke_all_for_user(user_id, except_device_id, reason);
        let revoked = bounded("revoke_all_for_user", self.config.store_timeout, call).await?;
        info!(
            user_id = %user_id,
            except_device_id = except_device_id.unwrap_or("-"),
            reason = %reason,
            revoked,
            "Revoked user sessions"
        );
        Ok(revoked)
    }

    async fn revoke_selector(
        &self,
        selector: &SessionSelector,
        reason: &RevocationReason,
    ) -> Result<usize, DomainError> {
        let matched = bounded(
            "revoke",
            self.config.store_timeout,
            self.sessions.revoke(selector, reason),
        )
        .await?;
        if matched > 0 {
            info!(reason = %reason, matched, "Revoked session");
        }
        Ok(matched)
    }
}
