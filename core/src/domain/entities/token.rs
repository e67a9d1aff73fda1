//! Token entities for JWT-based authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Access token expiration time (15 minutes)
pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiration time (30 days)
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

/// Discriminator preventing an access token from being used as a refresh token and vice versa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims structure for JWT payload
///
/// `iat`, `exp` and `iss` are stamped by the codec at encode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Owning user
    pub user_id: Uuid,

    pub email: String,

    /// Only present on access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Session this token was issued under
    pub session_id: String,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// JWT ID, unique per token
    pub jti: String,
}

impl Claims {
    /// Creates claims for an access token
    pub fn new_access_token(
        user_id: Uuid,
        email: impl Into<String>,
        role: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self::unstamped(user_id, email.into(), Some(role.into()), session_id.into(), TokenType::Access)
    }

    /// Creates claims for a refresh token
    pub fn new_refresh_token(
        user_id: Uuid,
        email: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self::unstamped(user_id, email.into(), None, session_id.into(), TokenType::Refresh)
    }

    fn unstamped(
        user_id: Uuid,
        email: String,
        role: Option<String>,
        session_id: String,
        token_type: TokenType,
    ) -> Self {
        Self {
            user_id,
            email,
            role,
            session_id,
            token_type,
            iat: 0,
            exp: 0,
            iss: String::new(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A signed token together with its expiry
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for EncodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token pair returned to the caller
///
/// Never persisted; only hashes of these strings reach the session store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,

    /// JWT refresh token
    pub refresh_token: String,

    /// Session both tokens belong to
    pub session_id: String,

    /// Access token expiry
    pub expires_at: DateTime<Utc>,

    /// Refresh token (and session) expiry
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn new(access: EncodedToken, refresh: EncodedToken, session_id: impl Into<String>) -> Self {
        Self {
            access_token: access.token,
            refresh_token: refresh.token,
            session_id: session_id.into(),
            expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        }
    }

    /// Seconds until the access token expires
    pub fn access_expires_in(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }

    /// Seconds until the refresh token expires
    pub fn refresh_expires_in(&self) -> i64 {
        (self.refresh_expires_at - Utc::now()).num_seconds().max(0)
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("session_id", &self.session_id)
            .field("expires_at", &self.expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// Default lifetime for access tokens
pub fn default_access_ttl() -> Duration {
    Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES)
}

/// Default lifetime for refresh tokens and sessions
pub fn default_refresh_ttl() -> Duration {
    Duration::days(REFRESH_TOKEN_EXPIRY_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new_access_token(user_id, "a@example.com", "admin", "sess-1");

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert_eq!(claims.session_id, "sess-1");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_token_claims_have_no_role() {
        let claims = Claims::new_refresh_token(Uuid::new_v4(), "a@example.com", "sess-1");
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.role, None);
    }

    #[test]
    fn test_jti_is_unique() {
        let user_id = Uuid::new_v4();
        let a = Claims::new_refresh_token(user_id, "a@example.com", "sess-1");
        let b = Claims::new_refresh_token(user_id, "a@example.com", "sess-1");
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_claims_wire_format() {
        let claims = Claims::new_access_token(Uuid::new_v4(), "a@example.com", "user", "sess-1");
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["type"], "access");
        assert_eq!(json["sessionId"], "sess-1");
        assert!(json.get("userId").is_some());
        assert!(json.get("token_type").is_none());

        let refresh = Claims::new_refresh_token(Uuid::new_v4(), "a@example.com", "sess-1");
        let json = serde_json::to_value(&refresh).unwrap();
        assert!(json.get("role").is_none());
    }

    #[test]
    fn test_token_pair_debug_is_redacted() {
        let now = Utc::now();
        let pair = TokenPair::new(
            EncodedToken { token: "raw-access".to_string(), expires_at: now },
            EncodedToken { token: "raw-refresh".to_string(), expires_at: now },
            "sess-1",
        );
        let rendered = format!("{:?}", pair);
        assert!(!rendered.contains("raw-access"));
        assert!(!rendered.contains("raw-refresh"));
        assert!(rendered.contains("sess-1"));
    }

    #[test]
    fn test_token_pair_expires_in() {
        let now = Utc::now();
        let pair = TokenPair::new(
            EncodedToken { token: "a".to_string(), expires_at: now + default_access_ttl() },
            EncodedToken { token: "r".to_string(), expires_at: now + default_refresh_ttl() },
            "sess-1",
        );
        assert!(pair.access_expires_in() <= ACCESS_TOKEN_EXPIRY_MINUTES * 60);
        assert!(pair.access_expires_in() > ACCESS_TOKEN_EXPIRY_MINUTES * 60 - 5);
        assert!(pair.refresh_expires_in() > pair.access_expires_in());
    }
}
