//! In-memory implementation of SessionRepository
//!
//! Suitable for tests and single-process deployments. All mutations run
//! under one write lock, which is what makes `replace` a compare-and-swap.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::session::{RevocationReason, Session, SessionSelector, SessionSummary};
use crate::errors::DomainError;

use super::r#trait::{SessionRepository, SessionRotation};

/// Session store keyed by session id
#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a row as-is, bypassing duplicate checks
    pub async fn insert_raw(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
    }

    /// Total rows, live or not
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn find_live<F>(sessions: &HashMap<String, Session>, user_id: Uuid, pred: F) -> Option<Session>
    where
        F: Fn(&Session) -> bool,
    {
        let now = Utc::now();
        sessions
            .values()
            .find(|s| s.user_id == user_id && s.is_live_at(now) && pred(s))
            .cloned()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: Session) -> Result<String, DomainError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&session.session_id) {
            return Err(DomainError::persistence("Session id already exists"));
        }
        let hash_taken = sessions.values().any(|s| {
            s.access_token_hash == session.access_token_hash
                || s.refresh_token_hash == session.refresh_token_hash
        });
        if hash_taken {
            return Err(DomainError::persistence("Token hash already exists"));
        }

        let id = session.session_id.clone();
        sessions.insert(id.clone(), session);
        Ok(id)
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn find_by_user_and_access_hash(
        &self,
        user_id: Uuid,
        access_hash: &str,
    ) -> Result<Option<Session>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(Self::find_live(&sessions, user_id, |s| s.access_token_hash == access_hash))
    }

    async fn find_by_user_and_refresh_hash(
        &self,
        user_id: Uuid,
        refresh_hash: &str,
    ) -> Result<Option<Session>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(Self::find_live(&sessions, user_id, |s| s.refresh_token_hash == refresh_hash))
    }

    async fn touch_activity(&self, session_id: &str) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        match sessions.get_mut(session_id) {
            Some(session) if session.is_live_at(now) => {
                session.last_activity = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn replace(
        &self,
        session_id: &str,
        expected_refresh_hash: &str,
        rotation: SessionRotation,
    ) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();

        let current = match sessions.get(session_id) {
            Some(s) if s.is_live_at(now) && s.refresh_token_hash == expected_refresh_hash => s,
            _ => return Ok(false),
        };
        if rotation.new_session_id != session_id && sessions.contains_key(&rotation.new_session_id) {
            return Err(DomainError::persistence("Session id already exists"));
        }

        let mut updated = current.clone();
        updated.session_id = rotation.new_session_id;
        updated.access_token_hash = rotation.new_access_hash;
        updated.refresh_token_hash = rotation.new_refresh_hash;
        updated.expires_at = rotation.new_expires_at;
        updated.last_activity = now;

        sessions.remove(session_id);
        sessions.insert(updated.session_id.clone(), updated);
        Ok(true)
    }

    async fn update_access_hash(
        &self,
        session_id: &str,
        expected_refresh_hash: &str,
        new_access_hash: &str,
    ) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        match sessions.get_mut(session_id) {
            Some(s) if s.is_live_at(now) && s.refresh_token_hash == expected_refresh_hash => {
                s.access_token_hash = new_access_hash.to_string();
                s.last_activity = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(
        &self,
        selector: &SessionSelector,
        reason: &RevocationReason,
    ) -> Result<usize, DomainError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let mut matched = 0;

        for session in sessions.values_mut().filter(|s| s.matches(selector)) {
            session.revoke(reason, now);
            matched += 1;
        }

        Ok(matched)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_device_id: Option<&str>,
        reason: &RevocationReason,
    ) -> Result<usize, DomainError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let mut count = 0;

        for session in sessions.values_mut() {
            if session.user_id != user_id || !session.is_live_at(now) {
                continue;
            }
            if except_device_id == Some(session.device_id.as_str()) {
                continue;
            }
            if session.revoke(reason, now) {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut sessions = self.sessions.write().await;
        let initial_count = sessions.len();

        sessions.retain(|_, session| !session.is_expired_at(now));

        Ok(initial_count - sessions.len())
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, DomainError> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();

        let mut active: Vec<SessionSummary> = sessions
            .values()
            .filter(|s| s.user_id == user_id && s.is_live_at(now))
            .map(Session::summary)
            .collect();
        active.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));

        Ok(active)
    }
}
