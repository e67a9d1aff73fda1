//! Database configuration module

use serde::{Deserialize, Serialize};

use super::error::{parse_or, require, ConfigError};

/// Database configuration for the MySQL session store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout: u64,

    /// Maximum lifetime of a connection in seconds
    pub max_lifetime: u64,
}

impl DatabaseConfig {
    /// Create a new database configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            connect_timeout: 30,
            idle_timeout: 600,
            max_lifetime: 1800,
        }
    }

    /// Create from a key lookup function; `DATABASE_URL` is required
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::new(require(&lookup, "DATABASE_URL")?);
        Ok(Self {
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            connect_timeout: parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT", defaults.connect_timeout)?,
            ..defaults
        })
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Check if this is a production database
    pub fn is_production(&self) -> bool {
        !self.url.contains("localhost") && !self.url.contains("127.0.0.1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_required() {
        let err = DatabaseConfig::from_lookup(|_| None).unwrap_err();
        assert_eq!(err, ConfigError::missing("DATABASE_URL"));
    }

    #[test]
    fn test_database_config_overrides() {
        let config = DatabaseConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mysql://localhost:3306/tollgate".to_string()),
            "DATABASE_MAX_CONNECTIONS" => Some("25".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.max_connections, 25);
        assert_eq!(config.connect_timeout, 30);
        assert!(!config.is_production());
    }
}
