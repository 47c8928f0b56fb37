//! Error types for configuration validation.

use thiserror::Error;

/// Errors raised when an exporter configuration is not usable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No connection URL configured
    #[error("Connection error: {0}")]
    Connection(String),

    /// A bulk limit is set to a value that can never admit a record
    #[error("Bulk config error: {0}")]
    Bulk(String),

    /// Index naming configuration is unusable
    #[error("Index config error: {0}")]
    Index(String),

    /// Retention configuration is unusable
    #[error("Retention config error: {0}")]
    Retention(String),
}
