//! MySQL implementation of the UserRepository trait.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use tg_core::domain::entities::user::User;
use tg_core::errors::DomainError;
use tg_core::repositories::UserRepository;

use super::{column_error, store_error};

/// Read-only user lookup over the `users` table
#[derive(Clone)]
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DomainError> {
        let row = sqlx::query("SELECT id, email, role, is_active FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("Failed to find user"))?;

        match row {
            Some(row) => Ok(Some(User {
                id: user_id,
                email: row.try_get("email").map_err(column_error("email"))?,
                role: row.try_get("role").map_err(column_error("role"))?,
                is_active: row.try_get("is_active").map_err(column_error("is_active"))?,
            })),
            None => Ok(None),
        }
    }
}
