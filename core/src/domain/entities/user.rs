//! User record as seen by the session engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The subset of a user account needed to authorize tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    /// Inactive users cannot verify or refresh tokens
    pub is_active: bool,
}

impl User {
    pub fn new(id: Uuid, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            role: role.into(),
            is_active: true,
        }
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
