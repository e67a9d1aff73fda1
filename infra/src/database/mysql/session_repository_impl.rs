//! MySQL implementation of the SessionRepository trait.
//!
//! Liveness (`is_revoked = FALSE AND expires_at >= now`) is evaluated in SQL
//! with `now` bound from the application clock, so every lookup and
//! conditional update sees the same notion of time as the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;
use uuid::Uuid;

use tg_core::domain::entities::session::{
    LoginMethod, RevocationReason, Session, SessionMetadata, SessionSelector, SessionSummary,
};
use tg_core::errors::DomainError;
use tg_core::repositories::{SessionRepository, SessionRotation};

use super::{column_error, store_error};

const COLUMNS: &str = "session_id, user_id, device_id, access_token_hash, refresh_token_hash, \
    created_at, expires_at, last_activity, is_revoked, revoked_at, revoked_reason, \
    ip_address, user_agent, device_name, browser, os, login_method";

const LIVE: &str = "is_revoked = FALSE AND expires_at >= ?";

/// MySQL-backed session store over the `user_sessions` table
#[derive(Clone)]
pub struct MySqlSessionRepository {
    pool: MySqlPool,
}

impl MySqlSessionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_session(row: &MySqlRow) -> Result<Session, DomainError> {
        let user_id: String = row.try_get("user_id").map_err(column_error("user_id"))?;
        let login_method: String = row.try_get("login_method").map_err(column_error("login_method"))?;

        Ok(Session {
            session_id: row.try_get("session_id").map_err(column_error("session_id"))?,
            user_id: Uuid::parse_str(&user_id).map_err(|e| DomainError::Internal {
                message: format!("Invalid user UUID: {}", e),
            })?,
            device_id: row.try_get("device_id").map_err(column_error("device_id"))?,
            access_token_hash: row
                .try_get("access_token_hash")
                .map_err(column_error("access_token_hash"))?,
            refresh_token_hash: row
                .try_get("refresh_token_hash")
                .map_err(column_error("refresh_token_hash"))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(column_error("created_at"))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(column_error("expires_at"))?,
            last_activity: row
                .try_get::<DateTime<Utc>, _>("last_activity")
                .map_err(column_error("last_activity"))?,
            is_revoked: row.try_get("is_revoked").map_err(column_error("is_revoked"))?,
            revoked_at: row
                .try_get::<Option<DateTime<Utc>>, _>("revoked_at")
                .map_err(column_error("revoked_at"))?,
            revoked_reason: row.try_get("revoked_reason").map_err(column_error("revoked_reason"))?,
            metadata: SessionMetadata {
                ip_address: row.try_get("ip_address").map_err(column_error("ip_address"))?,
                user_agent: row.try_get("user_agent").map_err(column_error("user_agent"))?,
                device_name: row.try_get("device_name").map_err(column_error("device_name"))?,
                browser: row.try_get("browser").map_err(column_error("browser"))?,
                os: row.try_get("os").map_err(column_error("os"))?,
                login_method: login_method.parse().unwrap_or(LoginMethod::Unknown),
            },
        })
    }

    fn selector_clause(selector: &SessionSelector) -> (&'static str, Vec<&str>) {
        match selector {
            SessionSelector::SessionId(id) => ("session_id = ?", vec![id.as_str()]),
            SessionSelector::TokenHashOrDevice(value) => (
                "(access_token_hash = ? OR refresh_token_hash = ? OR device_id = ?)",
                vec![value.as_str(), value.as_str(), value.as_str()],
            ),
        }
    }

    async fn find_live_by(
        &self,
        column: &'static str,
        user_id: Uuid,
        hash: &str,
    ) -> Result<Option<Session>, DomainError> {
        let query = format!(
            "SELECT {} FROM user_sessions WHERE user_id = ? AND {} = ? AND {} LIMIT 1",
            COLUMNS, column, LIVE
        );

        let row = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(hash)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("Failed to find session"))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }
}

#[async_trait]
impl SessionRepository for MySqlSessionRepository {
    async fn create(&self, session: Session) -> Result<String, DomainError> {
        let query = format!(
            "INSERT INTO user_sessions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            COLUMNS
        );

        sqlx::query(&query)
            .bind(&session.session_id)
            .bind(session.user_id.to_string())
            .bind(&session.device_id)
            .bind(&session.access_token_hash)
            .bind(&session.refresh_token_hash)
            .bind(session.created_at)
            .bind(session.expires_at)
            .bind(session.last_activity)
            .bind(session.is_revoked)
            .bind(session.revoked_at)
            .bind(&session.revoked_reason)
            .bind(&session.metadata.ip_address)
            .bind(&session.metadata.user_agent)
            .bind(&session.metadata.device_name)
            .bind(&session.metadata.browser)
            .bind(&session.metadata.os)
            .bind(session.metadata.login_method.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    DomainError::persistence("Session id or token hash already exists")
                }
                other => store_error("Failed to create session")(other),
            })?;

        Ok(session.session_id)
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>, DomainError> {
        let query = format!("SELECT {} FROM user_sessions WHERE session_id = ?", COLUMNS);

        let row = sqlx::query(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("Failed to find session by id"))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn find_by_user_and_access_hash(
        &self,
        user_id: Uuid,
        access_hash: &str,
    ) -> Result<Option<Session>, DomainError> {
        self.find_live_by("access_token_hash", user_id, access_hash).await
    }

    async fn find_by_user_and_refresh_hash(
        &self,
        user_id: Uuid,
        refresh_hash: &str,
    ) -> Result<Option<Session>, DomainError> {
        self.find_live_by("refresh_token_hash", user_id, refresh_hash).await
    }

    async fn touch_activity(&self, session_id: &str) -> Result<bool, DomainError> {
        let now = Utc::now();
        let query = format!(
            "UPDATE user_sessions SET last_activity = ? WHERE session_id = ? AND {}",
            LIVE
        );

        let result = sqlx::query(&query)
            .bind(now)
            .bind(session_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(store_error("Failed to touch session"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace(
        &self,
        session_id: &str,
        expected_refresh_hash: &str,
        rotation: SessionRotation,
    ) -> Result<bool, DomainError> {
        let now = Utc::now();
        let query = format!(
            r#"
            UPDATE user_sessions
            SET session_id = ?, access_token_hash = ?, refresh_token_hash = ?,
                expires_at = ?, last_activity = ?
            WHERE session_id = ? AND refresh_token_hash = ? AND {}
            "#,
            LIVE
        );

        let result = sqlx::query(&query)
            .bind(&rotation.new_session_id)
            .bind(&rotation.new_access_hash)
            .bind(&rotation.new_refresh_hash)
            .bind(rotation.new_expires_at)
            .bind(now)
            .bind(session_id)
            .bind(expected_refresh_hash)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(store_error("Failed to rotate session"))?;

        let swapped = result.rows_affected() == 1;
        debug!(session_id, swapped, "Conditional session replace");
        Ok(swapped)
    }

    async fn update_access_hash(
        &self,
        session_id: &str,
        expected_refresh_hash: &str,
        new_access_hash: &str,
    ) -> Result<bool, DomainError> {
        let now = Utc::now();
        let query = format!(
            r#"
            UPDATE user_sessions
            SET access_token_hash = ?, last_activity = ?
            WHERE session_id = ? AND refresh_token_hash = ? AND {}
            "#,
            LIVE
        );

        let result = sqlx::query(&query)
            .bind(new_access_hash)
            .bind(now)
            .bind(session_id)
            .bind(expected_refresh_hash)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(store_error("Failed to update access hash"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(
        &self,
        selector: &SessionSelector,
        reason: &RevocationReason,
    ) -> Result<usize, DomainError> {
        let (clause, params) = Self::selector_clause(selector);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(store_error("Failed to begin revocation"))?;

        let count_query = format!("SELECT COUNT(*) AS matched FROM user_sessions WHERE {}", clause);
        let mut count = sqlx::query(&count_query);
        for param in &params {
            count = count.bind(*param);
        }
        let row = count
            .fetch_one(&mut *tx)
            .await
            .map_err(store_error("Failed to count sessions"))?;
        let matched: i64 = row.try_get("matched").map_err(column_error("matched"))?;

        // Rows already revoked keep their original timestamp and reason
        let update_query = format!(
            "UPDATE user_sessions SET is_revoked = TRUE, revoked_at = ?, revoked_reason = ? \
             WHERE {} AND is_revoked = FALSE",
            clause
        );
        let mut update = sqlx::query(&update_query).bind(Utc::now()).bind(reason.as_str());
        for param in &params {
            update = update.bind(*param);
        }
        update
            .execute(&mut *tx)
            .await
            .map_err(store_error("Failed to revoke session"))?;

        tx.commit().await.map_err(store_error("Failed to commit revocation"))?;
        Ok(matched as usize)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_device_id: Option<&str>,
        reason: &RevocationReason,
    ) -> Result<usize, DomainError> {
        let now = Utc::now();
        let query = format!(
            r#"
            UPDATE user_sessions
            SET is_revoked = TRUE, revoked_at = ?, revoked_reason = ?
            WHERE user_id = ? AND {} AND (? IS NULL OR device_id <> ?)
            "#,
            LIVE
        );

        let result = sqlx::query(&query)
            .bind(now)
            .bind(reason.as_str())
            .bind(user_id.to_string())
            .bind(now)
            .bind(except_device_id)
            .bind(except_device_id)
            .execute(&self.pool)
            .await
            .map_err(store_error("Failed to revoke user sessions"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(store_error("Failed to delete expired sessions"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, DomainError> {
        let query = format!(
            "SELECT {} FROM user_sessions WHERE user_id = ? AND {} ORDER BY last_activity DESC",
            COLUMNS, LIVE
        );

        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("Failed to list sessions"))?;

        rows.iter()
            .map(|row| Self::row_to_session(row).map(|s| s.summary()))
            .collect()
    }

    async fn count_active(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let query = format!(
            "SELECT COUNT(*) AS active FROM user_sessions WHERE user_id = ? AND {}",
            LIVE
        );

        let row = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error("Failed to count sessions"))?;

        let active: i64 = row.try_get("active").map_err(column_error("active"))?;
        Ok(active as usize)
    }
}
