//! Session service facade
//!
//! Single entry point for callers. Authentication failures collapse into
//! `None`; the precise reason only reaches the logs.

use chrono::Utc;
use std::sync::Arc;
use tg_shared::ReaperConfig;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::entities::session::{ClientContext, RevocationReason, SessionSummary};
use crate::domain::entities::token::{Claims, TokenPair};
use crate::domain::value_objects::Principal;
use crate::errors::DomainError;
use crate::repositories::{SessionRepository, UserRepository};

use super::cleanup::SessionReaper;
use super::codec::TokenCodec;
use super::config::TokenServiceConfig;
use super::hashing::{Sha256TokenHasher, TokenHasher};
use super::issuer::TokenIssuer;
use super::revocation::RevocationManager;
use super::rotation::RotationOrchestrator;
use super::store::bounded;
use super::verifier::TokenVerifier;

/// Token and session lifecycle service
pub struct SessionService<S: SessionRepository + 'static, U: UserRepository> {
    sessions: Arc<S>,
    config: Arc<TokenServiceConfig>,
    issuer: TokenIssuer<S>,
    verifier: TokenVerifier<S, U>,
    rotation: RotationOrchestrator<S, U>,
    revocation: RevocationManager<S>,
    reaper: Arc<SessionReaper<S>>,
}

impl<S: SessionRepository + 'static, U: UserRepository> SessionService<S, U> {
    /// Creates a service with SHA-256 token hashing and the default reaper schedule
    pub fn new(sessions: Arc<S>, users: Arc<U>, config: TokenServiceConfig) -> Self {
        Self::with_components(
            sessions,
            users,
            config,
            Arc::new(Sha256TokenHasher),
            ReaperConfig::default(),
        )
    }

    /// Creates a service with an explicit hasher and reaper schedule
    pub fn with_components(
        sessions: Arc<S>,
        users: Arc<U>,
        config: TokenServiceConfig,
        hasher: Arc<dyn TokenHasher>,
        reaper_config: ReaperConfig,
    ) -> Self {
        let config = Arc::new(config);
        let codec = Arc::new(TokenCodec::new(&config));

        Self {
            issuer: TokenIssuer::new(codec.clone(), sessions.clone(), hasher.clone(), config.clone()),
            verifier: TokenVerifier::new(
                codec.clone(),
                sessions.clone(),
                users.clone(),
                hasher.clone(),
                config.clone(),
            ),
            rotation: RotationOrchestrator::new(codec, sessions.clone(), users, hasher.clone(), config.clone()),
            revocation: RevocationManager::new(sessions.clone(), hasher, config.clone()),
            reaper: Arc::new(SessionReaper::new(sessions.clone(), reaper_config, config.store_timeout)),
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Shared handle to the reaper, e.g. for `start_background_task`
    pub fn reaper(&self) -> Arc<SessionReaper<S>> {
        self.reaper.clone()
    }

    /// Issue a token pair for an authenticated user
    ///
    /// Any store failure, timeouts included, fails the login.
    pub async fn issue_token_pair(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
        context: &ClientContext,
    ) -> Result<TokenPair, DomainError> {
        self.issuer.issue(user_id, email, role, context).await
    }

    /// Verify an access token, failing closed
    ///
    /// Returns `None` for every failure, store outages included.
    pub async fn verify_access_token(&self, token: &str) -> Option<Principal> {
        match self.verifier.verify(token).await {
            Ok(principal) => Some(principal),
            Err(e) if e.is_authentication_failure() => {
                debug!(reason = %e, "Access token rejected");
                None
            }
            Err(e) => {
                error!(error = %e, "Access token verification failed closed");
                None
            }
        }
    }

    /// Exchange a refresh token for a new pair
    ///
    /// # Returns
    /// * `Ok(Some(TokenPair))` - Refreshed
    /// * `Ok(None)` - Token or session rejected; the user must log in again
    /// * `Err(DomainError)` - Store unavailable; `is_retryable()` is true
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<Option<TokenPair>, DomainError> {
        match self.rotation.refresh(refresh_token).await {
            Ok(pair) => Ok(Some(pair)),
            Err(e) if e.is_authentication_failure() => {
                debug!(reason = %e, "Refresh rejected");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed on session store");
                Err(e)
            }
        }
    }

    /// Revoke a session by id, token hash or device id
    pub async fn revoke_session(
        &self,
        identifier: &str,
        reason: Option<RevocationReason>,
    ) -> Result<bool, DomainError> {
        self.revocation.revoke(identifier, &reason.unwrap_or_default()).await
    }

    /// Revoke the session a raw token belongs to
    pub async fn revoke_token(&self, token: &str, reason: Option<RevocationReason>) -> Result<bool, DomainError> {
        self.revocation.revoke_token(token, &reason.unwrap_or_default()).await
    }

    /// Revoke every session of a user except, optionally, one device
    pub async fn revoke_all_sessions(
        &self,
        user_id: Uuid,
        except_device_id: Option<&str>,
    ) -> Result<usize, DomainError> {
        let reason = match except_device_id {
            Some(_) => RevocationReason::LogoutOtherDevices,
            None => RevocationReason::Logout,
        };
        self.revocation
            .revoke_all_for_user(user_id, except_device_id, &reason)
            .await
    }

    /// Live sessions of a user, most recently active first
    pub async fn list_active_sessions(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, DomainError> {
        bounded(
            "list_active",
            self.config.store_timeout,
            self.sessions.list_active(user_id),
        )
        .await
    }

    /// Delete sessions that expired before now
    pub async fn sweep_expired_sessions(&self) -> Result<usize, DomainError> {
        self.reaper.sweep(Utc::now()).await
    }

    /// Structural decode without verification; diagnostics only
    pub fn decode_unsafe(&self, token: &str) -> Option<Claims> {
        TokenCodec::decode_unsafe(token)
    }
}
