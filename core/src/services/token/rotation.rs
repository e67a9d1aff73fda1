//! Refresh token exchange

use std::fmt;
use std::sync::Arc;
use tg_shared::RotationPolicy;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::session::Session;
use crate::domain::entities::token::{Claims, TokenPair, TokenType};
use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainError};
use crate::repositories::{SessionRepository, SessionRotation, UserRepository};

use super::codec::TokenCodec;
use super::config::TokenServiceConfig;
use super::hashing::{hash_prefix, TokenHasher};
use super::store::bounded;
use super::verifier::active_user;

/// Progress of a single refresh request, logged at each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStage {
    Received,
    Decoded,
    SessionValidated,
    Rotated,
    Reused,
    Returned,
    RejectedBadToken,
    RejectedNoSession,
}

impl RotationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStage::Received => "received",
            RotationStage::Decoded => "decoded",
            RotationStage::SessionValidated => "session_validated",
            RotationStage::Rotated => "rotated",
            RotationStage::Reused => "reused",
            RotationStage::Returned => "returned",
            RotationStage::RejectedBadToken => "rejected_bad_token",
            RotationStage::RejectedNoSession => "rejected_no_session",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RotationStage::Returned | RotationStage::RejectedBadToken | RotationStage::RejectedNoSession
        )
    }
}

impl fmt::Display for RotationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn stage(stage: RotationStage, session_id: Option<&str>) {
    debug!(stage = stage.as_str(), session_id = session_id.unwrap_or("-"), "Refresh transition");
}

/// Exchanges a refresh token for a new pair under the configured [`RotationPolicy`]
pub struct RotationOrchestrator<S: SessionRepository, U: UserRepository> {
    codec: Arc<TokenCodec>,
    sessions: Arc<S>,
    users: Arc<U>,
    hasher: Arc<dyn TokenHasher>,
    config: Arc<TokenServiceConfig>,
}

impl<S: SessionRepository, U: UserRepository> RotationOrchestrator<S, U> {
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

    pub fn policy(&self) -> RotationPolicy {
        self.config.rotation_policy
    }

    /// Exchange `refresh_token` for a new pair
    ///
    /// # Returns
    /// * `Ok(TokenPair)` - New pair; under `Rotate` the presented token is now dead
    /// * `Err(DomainError::Token | DomainError::Auth)` - Rejected
    /// * `Err(DomainError::Persistence | DomainError::StoreTimeout)` - Store unavailable
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        stage(RotationStage::Received, None);

        let claims = match self.codec.decode_expecting(refresh_token, TokenType::Refresh) {
            Ok(claims) => claims,
            Err(e) => {
                stage(RotationStage::RejectedBadToken, None);
                return Err(e.into());
            }
        };
        stage(RotationStage::Decoded, Some(&claims.session_id));

        let user = match active_user(self.users.as_ref(), &self.config, claims.user_id).await {
            Ok(user) => user,
            Err(e) => {
                if e.is_authentication_failure() {
                    stage(RotationStage::RejectedNoSession, Some(&claims.session_id));
                }
                return Err(e);
            }
        };

        let refresh_hash = self.hasher.hash(refresh_token);
        let lookup = self.sessions.find_by_user_and_refresh_hash(claims.user_id, &refresh_hash);
        let session = match bounded("find_by_refresh_hash", self.config.store_timeout, lookup).await? {
            Some(session) => session,
            None => {
                warn!(
                    user_id = %claims.user_id,
                    session_id = %claims.session_id,
                    refresh_hash = hash_prefix(&refresh_hash),
                    "Refresh token matches no live session (stale, revoked or replayed)"
                );
                stage(RotationStage::RejectedNoSession, Some(&claims.session_id));
                return Err(AuthError::SessionNotFound.into());
            }
        };
        stage(RotationStage::SessionValidated, Some(&session.session_id));

        let pair = match self.config.rotation_policy {
            RotationPolicy::Rotate => self.rotate(&user, &session, &refresh_hash).await?,
            RotationPolicy::Reuse => self.reuse(&user, &session, refresh_token, &refresh_hash).await?,
        };

        stage(RotationStage::Returned, Some(&pair.session_id));
        Ok(pair)
    }

    async fn rotate(
        &self,
        user: &User,
        session: &Session,
        refresh_hash: &str,
    ) -> Result<TokenPair, DomainError> {
        let new_session_id = Uuid::new_v4().to_string();
        let pair = self.codec.mint_pair(user.id, &user.email, &user.role, &new_session_id)?;
        let rotation = SessionRotation {
            new_session_id: new_session_id.clone(),
            new_access_hash: self.hasher.hash(&pair.access_token),
            new_refresh_hash: self.hasher.hash(&pair.refresh_token),
            new_expires_at: pair.refresh_expires_at,
        };

        let replace = self.sessions.replace(&session.session_id, refresh_hash, rotation);
        if !bounded("replace", self.config.store_timeout, replace).await? {
            warn!(
                session_id = %session.session_id,
                refresh_hash = hash_prefix(refresh_hash),
                "Lost rotation race; refresh token already used"
            );
            stage(RotationStage::RejectedNoSession, Some(&session.session_id));
            return Err(AuthError::RotationConflict.into());
        }

        stage(RotationStage::Rotated, Some(&new_session_id));
        info!(
            user_id = %user.id,
            old_session_id = %session.session_id,
            new_session_id = %new_session_id,
            "Rotated session"
        );
        Ok(pair)
    }

    /// Reissues only the access token.
    ///
    /// The returned `refresh_token` is the one presented and `refresh_expires_at`
    /// is the session's existing expiry; neither is renewed.
    async fn reuse(
        &self,
        user: &User,
        session: &Session,
        refresh_token: &str,
        refresh_hash: &str,
    ) -> Result<TokenPair, DomainError> {
        let access = self.codec.encode(Claims::new_access_token(
            user.id,
            &user.email,
            &user.role,
            &session.session_id,
        ))?;
        let access_hash = self.hasher.hash(&access.token);

        let update = self
            .sessions
            .update_access_hash(&session.session_id, refresh_hash, &access_hash);
        if !bounded("update_access_hash", self.config.store_timeout, update).await? {
            stage(RotationStage::RejectedNoSession, Some(&session.session_id));
            return Err(AuthError::SessionNotFound.into());
        }

        stage(RotationStage::Reused, Some(&session.session_id));
        info!(user_id = %user.id, session_id = %session.session_id, "Reissued access token");
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh_token.to_string(),
            session_id: session.session_id.clone(),
            expires_at: access.expires_at,
            refresh_expires_at: session.expires_at,
        })
    }
}
