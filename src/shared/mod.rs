//! Shared Module
//!
//! Types that do not belong to a single engine: process configuration and
//! request validation errors.

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, AuthSettings, ConfigError};
