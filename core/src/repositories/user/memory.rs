//! In-memory implementation of UserRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

use super::r#trait::UserRepository;

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    /// Mark a user inactive. Returns `false` if the user is unknown.
    pub async fn deactivate(&self, user_id: Uuid) -> bool {
        match self.users.write().await.get_mut(&user_id) {
            Some(user) => {
                user.deactivate();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}
