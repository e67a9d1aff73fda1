//! Token signing and session policy configuration

use serde::{Deserialize, Serialize};
use std::fmt;

use super::environment::Environment;
use super::error::{parse_or, require, ConfigError};

/// Minimum secret length accepted in production
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime or activity interval (ten years), in seconds
pub const MAX_LIFETIME_SECONDS: i64 = 10 * 365 * 86400;

/// JWT signing configuration
///
/// There is deliberately no `Default`: secrets must come from the environment.
#[derive(Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// HMAC secret for access tokens
    pub access_secret: String,

    /// HMAC secret for refresh tokens
    pub refresh_secret: String,

    /// Issuer claim, constant per deployment
    pub issuer: String,

    /// Access token expiry time in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiry time in seconds
    pub refresh_token_expiry: i64,

    /// Clock skew tolerated when checking `exp`, in seconds
    #[serde(default)]
    pub leeway: u64,
}

impl JwtConfig {
    /// Create a configuration with default lifetimes (15 minutes / 30 days)
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            issuer: default_issuer(),
            access_token_expiry: 900,
            refresh_token_expiry: 2_592_000,
            leeway: 0,
        }
    }

    /// Set the issuer claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Build from a key lookup function (usually the process environment)
    pub fn from_lookup<F>(lookup: F, environment: Environment) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            access_secret: require(&lookup, "JWT_ACCESS_SECRET")?,
            refresh_secret: require(&lookup, "JWT_REFRESH_SECRET")?,
            issuer: lookup("JWT_ISSUER")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(default_issuer),
            access_token_expiry: parse_or(&lookup, "JWT_ACCESS_TOKEN_EXPIRY", 900)?,
            refresh_token_expiry: parse_or(&lookup, "JWT_REFRESH_TOKEN_EXPIRY", 2_592_000)?,
            leeway: parse_or(&lookup, "JWT_LEEWAY", 0)?,
        };
        config.validate(environment)?;
        Ok(config)
    }

    /// Check secrets and lifetimes
    pub fn validate(&self, environment: Environment) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::missing("JWT_ACCESS_SECRET"));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::missing("JWT_REFRESH_SECRET"));
        }
        if environment.is_production() {
            if self.access_secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::invalid(
                    "JWT_ACCESS_SECRET",
                    format!("must be at least {} bytes", MIN_PRODUCTION_SECRET_LEN),
                ));
            }
            if self.refresh_secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::invalid(
                    "JWT_REFRESH_SECRET",
                    format!("must be at least {} bytes", MIN_PRODUCTION_SECRET_LEN),
                ));
            }
            if self.access_secret == self.refresh_secret {
                return Err(ConfigError::invalid(
                    "JWT_REFRESH_SECRET",
                    "must differ from JWT_ACCESS_SECRET",
                ));
            }
        }
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::invalid("JWT_ACCESS_TOKEN_EXPIRY", "must be positive"));
        }
        if self.refresh_token_expiry > MAX_LIFETIME_SECONDS {
            return Err(ConfigError::invalid(
                "JWT_REFRESH_TOKEN_EXPIRY",
                format!("must not exceed {} seconds", MAX_LIFETIME_SECONDS),
            ));
        }
        if self.refresh_token_expiry <= self.access_token_expiry {
            return Err(ConfigError::invalid(
                "JWT_REFRESH_TOKEN_EXPIRY",
                "must be longer than the access token expiry",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("leeway", &self.leeway)
            .finish()
    }
}

/// What happens to a session's identity when its refresh token is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New session id and token hashes on every refresh; refresh tokens are single-use
    #[default]
    Rotate,
    /// Keep the session id and refresh token; only a new access token is recorded
    Reuse,
}

impl fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationPolicy::Rotate => write!(f, "rotate"),
            RotationPolicy::Reuse => write!(f, "reuse"),
        }
    }
}

impl std::str::FromStr for RotationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rotate" | "rotating" => Ok(RotationPolicy::Rotate),
            "reuse" | "non-rotating" | "none" => Ok(RotationPolicy::Reuse),
            _ => Err(format!("Invalid rotation policy: {}", s)),
        }
    }
}

/// Session store and lifecycle settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Refresh behaviour
    #[serde(default)]
    pub rotation_policy: RotationPolicy,

    /// Upper bound on every session store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Skip `last_activity` writes younger than this many seconds (0 = always write)
    #[serde(default)]
    pub activity_touch_interval: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rotation_policy: RotationPolicy::Rotate,
            store_timeout_ms: default_store_timeout_ms(),
            activity_touch_interval: 0,
        }
    }
}

impl SessionConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            rotation_policy: parse_or(&lookup, "SESSION_ROTATION_POLICY", RotationPolicy::Rotate)?,
            store_timeout_ms: parse_or(&lookup, "SESSION_STORE_TIMEOUT_MS", default_store_timeout_ms())?,
            activity_touch_interval: parse_or(&lookup, "SESSION_ACTIVITY_TOUCH_INTERVAL", 0)?,
        };
        if config.store_timeout_ms == 0 {
            return Err(ConfigError::invalid("SESSION_STORE_TIMEOUT_MS", "must be positive"));
        }
        if config.activity_touch_interval > MAX_LIFETIME_SECONDS as u64 {
            return Err(ConfigError::invalid(
                "SESSION_ACTIVITY_TOUCH_INTERVAL",
                format!("must not exceed {} seconds", MAX_LIFETIME_SECONDS),
            ));
        }
        Ok(config)
    }
}

/// Background sweep of expired sessions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReaperConfig {
    /// How often to run the sweep (in seconds)
    pub interval_seconds: u64,
    /// Whether the background sweep runs at all
    pub enabled: bool,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            enabled: true,
        }
    }
}

impl ReaperConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            interval_seconds: parse_or(&lookup, "SESSION_REAPER_INTERVAL", 3600)?,
            enabled: parse_or(&lookup, "SESSION_REAPER_ENABLED", true)?,
        };
        if config.interval_seconds == 0 {
            return Err(ConfigError::invalid("SESSION_REAPER_INTERVAL", "must be positive"));
        }
        Ok(config)
    }
}

fn default_issuer() -> String {
    String::from("tollgate")
}

fn default_store_timeout_ms() -> u64 {
    5000
}
