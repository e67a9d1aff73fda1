//! Shared configuration for the Tollgate session engine
//!
//! This crate provides the configuration types used across the workspace:
//! - Token signing and session policy settings
//! - Database connection settings
//! - Environment detection and logging configuration

pub mod config;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, ConfigError, DatabaseConfig, Environment, JwtConfig, LogFormat, LoggingConfig,
    ReaperConfig, RotationPolicy, SessionConfig,
};
