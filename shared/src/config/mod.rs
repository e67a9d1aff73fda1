//! Configuration module
//!
//! This module organizes configuration into logical areas:
//! - `auth` - Token signing, session policy and reaper settings
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `error` - Errors raised while loading configuration

pub mod auth;
pub mod database;
pub mod environment;
pub mod error;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use auth::{JwtConfig, ReaperConfig, RotationPolicy, SessionConfig};
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use error::ConfigError;

/// Configuration for the session engine, constructed once at process start
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Token signing configuration
    pub jwt: JwtConfig,

    /// Session store and refresh policy
    #[serde(default)]
    pub session: SessionConfig,

    /// Expired session sweep
    #[serde(default)]
    pub reaper: ReaperConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`, if present)
    ///
    /// Fails when signing secrets are absent; there are no built-in secrets.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_lookup(&lookup);
        Ok(Self {
            environment,
            jwt: JwtConfig::from_lookup(&lookup, environment)?,
            session: SessionConfig::from_lookup(&lookup)?,
            reaper: ReaperConfig::from_lookup(&lookup)?,
            logging: LoggingConfig::for_environment(environment),
        })
    }
}
