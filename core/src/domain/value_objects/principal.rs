//! Authenticated principal value object.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity established by a successfully verified access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub session_id: String,
}
