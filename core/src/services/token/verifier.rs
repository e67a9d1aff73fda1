//! Access token verification against the session store

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::entities::token::TokenType;
use crate::domain::entities::user::User;
use crate::domain::value_objects::Principal;
use crate::errors::{AuthError, DomainError};
use crate::repositories::{SessionRepository, UserRepository};

use super::codec::TokenCodec;
use super::config::TokenServiceConfig;
use super::hashing::{hash_prefix, TokenHasher};
use super::store::bounded;

/// Resolve the owner of a token, rejecting unknown and inactive accounts
pub(crate) async fn active_user<U: UserRepository>(
    users: &U,
    config: &TokenServiceConfig,
    user_id: uuid::Uuid,
) -> Result<User, DomainError> {
    match bounded("find_user", config.store_timeout, users.find_user(user_id)).await? {
        Some(user) if user.is_active => Ok(user),
        Some(_) => Err(AuthError::UserInactive.into()),
        None => Err(AuthError::UserNotFound.into()),
    }
}

/// Turns an access token into a [`Principal`] if, and only if, its session is live
pub struct TokenVerifier<S: SessionRepository, U: UserRepository> {
    codec: Arc<TokenCodec>,
    sessions: Arc<S>,
    users: Arc<U>,
    hasher: Arc<dyn TokenHasher>,
    config: Arc<TokenServiceConfig>,
}

impl<S: SessionRepository, U: UserRepository> TokenVerifier<S, U> {
    pub fn new(
        codec: Arc<TokenCodec>,
        sessions: Arc<S>,
        users: Arc<U>,
        hasher: Arc<dyn TokenHasher>,
        config: Arc<TokenServiceConfig>,
    ) -> Self {
        Self {
            codec,
            sessions,
            users,
            hasher,
            config,
        }
    }

    /// Verify an access token
    ///
    /// # Returns
    /// * `Ok(Principal)` - Token is valid and its session is live
    /// * `Err(DomainError::Token | DomainError::Auth)` - Authentication failure
    /// * `Err(DomainError::Persistence | DomainError::StoreTimeout)` - Store unavailable
    pub async fn verify(&self, token: &str) -> Result<Principal, DomainError> {
        let claims = self.codec.decode_expecting(token, TokenType::Access)?;
        let user = active_user(self.users.as_ref(), &self.config, claims.user_id).await?;

        let access_hash = self.hasher.hash(token);
        let lookup = self.sessions.find_by_user_and_access_hash(claims.user_id, &access_hash);
        let session = match bounded("find_by_access_hash", self.config.store_timeout, lookup).await? {
            Some(session) => session,
            None => return Err(self.classify_missing(&claims.session_id, &access_hash).await),
        };

        if session.session_id != claims.session_id {
            warn!(
                user_id = %claims.user_id,
                claimed_session = %claims.session_id,
                stored_session = %session.session_id,
                "Access token session id does not match stored session"
            );
            return Err(AuthError::SessionNotFound.into());
        }

        let now = Utc::now();
        if session.activity_is_stale(now, self.config.activity_touch_interval) {
            let touch = self.sessions.touch_activity(&session.session_id);
            if let Err(e) = bounded("touch_activity", self.config.store_timeout, touch).await {
                warn!(session_id = %session.session_id, error = %e, "Failed to record session activity");
            }
        }

        Ok(Principal {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role.unwrap_or(user.role),
            session_id: session.session_id,
        })
    }

    /// Distinguish a dead session from a stale token, for logging only
    async fn classify_missing(&self, session_id: &str, access_hash: &str) -> DomainError {
        let lookup = self.sessions.find_by_id(session_id);
        let reason = match bounded("find_by_id", self.config.store_timeout, lookup).await {
            Ok(Some(session)) if !session.is_live() => AuthError::SessionExpiredOrRevoked,
            _ => AuthError::SessionNotFound,
        };
        debug!(
            session_id = %session_id,
            access_hash = hash_prefix(access_hash),
            reason = %reason,
            "No live session for access token"
        );
        reason.into()
    }
}
