//! Configuration for the token service

use chrono::Duration;
use std::fmt;
use tg_shared::{AppConfig, JwtConfig, RotationPolicy, SessionConfig};

use crate::domain::entities::token::{default_access_ttl, default_refresh_ttl};
use crate::errors::DomainError;

/// Configuration for the token service
///
/// Built once at process start and shared by every component. There is no
/// `Default`: construction fails when either signing secret is empty.
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// HMAC secret for access tokens
    pub(crate) access_secret: String,
    /// HMAC secret for refresh tokens
    pub(crate) refresh_secret: String,
    /// Issuer claim
    pub issuer: String,
    pub access_ttl: Duration,
    /// Also the session lifetime
    pub refresh_ttl: Duration,
    /// Seconds of clock skew tolerated on `exp`
    pub leeway: u64,
    pub rotation_policy: RotationPolicy,
    /// Bound on every session store call
    pub store_timeout: std::time::Duration,
    /// Minimum age of `last_activity` before verification writes it again
    pub activity_touch_interval: Duration,
}

impl TokenServiceConfig {
    /// Creates a configuration with default lifetimes and policy
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();
        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(DomainError::Config {
                message: "token signing secrets must not be empty".to_string(),
            });
        }

        let session = SessionConfig::default();
        Ok(Self {
            access_secret,
            refresh_secret,
            issuer: issuer.into(),
            access_ttl: default_access_ttl(),
            refresh_ttl: default_refresh_ttl(),
            leeway: 0,
            rotation_policy: session.rotation_policy,
            store_timeout: std::time::Duration::from_millis(session.store_timeout_ms),
            activity_touch_interval: Duration::zero(),
        })
    }

    /// Builds the token configuration from shared JWT and session settings
    pub fn from_parts(jwt: &JwtConfig, session: &SessionConfig) -> Result<Self, DomainError> {
        let access_ttl = seconds("access token expiry", jwt.access_token_expiry)?;
        let refresh_ttl = seconds("refresh token expiry", jwt.refresh_token_expiry)?;
        let touch_interval = i64::try_from(session.activity_touch_interval)
            .map_err(|_| out_of_range("activity touch interval"))
            .and_then(|secs| seconds("activity touch interval", secs))?;

        let config = Self::new(&jwt.access_secret, &jwt.refresh_secret, &jwt.issuer)?
            .with_ttls(access_ttl, refresh_ttl)
            .with_rotation_policy(session.rotation_policy)
            .with_store_timeout(std::time::Duration::from_millis(session.store_timeout_ms))
            .with_activity_touch_interval(touch_interval);
        Ok(Self {
            leeway: jwt.leeway,
            ..config
        })
    }

    pub fn from_app_config(app: &AppConfig) -> Result<Self, DomainError> {
        Self::from_parts(&app.jwt, &app.session)
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn with_rotation_policy(mut self, policy: RotationPolicy) -> Self {
        self.rotation_policy = policy;
        self
    }

    pub fn with_store_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_activity_touch_interval(mut self, interval: Duration) -> Self {
        self.activity_touch_interval = interval;
        self
    }
}

fn seconds(what: &str, secs: i64) -> Result<Duration, DomainError> {
    Duration::try_seconds(secs).ok_or_else(|| out_of_range(what))
}

fn out_of_range(what: &str) -> DomainError {
    DomainError::Config {
        message: format!("{} is out of range", what),
    }
}

impl fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("leeway", &self.leeway)
            .field("rotation_policy", &self.rotation_policy)
            .field("store_timeout", &self.store_timeout)
            .field("activity_touch_interval", &self.activity_touch_interval)
            .finish()
    }
}
