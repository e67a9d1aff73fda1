//! Session creation at login

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::entities::session::{ClientContext, Session, SessionMetadata};
use crate::domain::entities::token::TokenPair;
use crate::errors::DomainError;
use crate::repositories::SessionRepository;

use super::codec::TokenCodec;
use super::config::TokenServiceConfig;
use super::hashing::{hash_prefix, TokenHasher};
use super::store::bounded;

/// Mints a token pair and records the session that backs it
pub struct TokenIssuer<S: SessionRepository> {
    codec: Arc<TokenCodec>,
    sessions: Arc<S>,
    hasher: Arc<dyn TokenHasher>,
    config: Arc<TokenServiceConfig>,
}

impl<S: SessionRepository> TokenIssuer<S> {
    pub fn new(
        codec: Arc<TokenCodec>,
        sessions: Arc<S>,
        hasher: Arc<dyn TokenHasher>,
        config: Arc<TokenServiceConfig>,
    ) -> Self {
        Self {
            codec,
            sessions,
            hasher,
            config,
        }
    }

    /// Issue a token pair for an already authenticated user
    ///
    /// The pair is only returned once its session row has been written; a
    /// store failure means no tokens leave this function.
    pub async fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
        context: &ClientContext,
    ) -> Result<TokenPair, DomainError> {
        let session_id = Uuid::new_v4().to_string();
        let device_id = context
            .device
            .device_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let pair = self.codec.mint_pair(user_id, email, role, &session_id)?;
        let access_hash = self.hasher.hash(&pair.access_token);
        let refresh_hash = self.hasher.hash(&pair.refresh_token);

        let session = Session::new(
            session_id.as_str(),
            user_id,
            device_id.as_str(),
            access_hash.as_str(),
            refresh_hash.as_str(),
            pair.refresh_expires_at,
            SessionMetadata::from(context),
        );

        if let Err(e) = bounded("create", self.config.store_timeout, self.sessions.create(session)).await {
            error!(
                user_id = %user_id,
                session_id = %session_id,
                error = %e,
                "Failed to persist new session"
            );
            return Err(e);
        }

        info!(
            user_id = %user_id,
            session_id = %session_id,
            device_id = %device_id,
            login_method = context.login_method.as_str(),
            access_hash = hash_prefix(&access_hash),
            "Issued token pair"
        );

        Ok(pair)
    }
}
