//! Error types for schema management.

use thiserror::Error;

use export_transport::TransportError;

/// Errors raised while reading or installing templates.
///
/// All of these are fatal to the startup or upgrade path that triggered
/// them; nothing is retried automatically.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Embedded template definition could not be parsed
    #[error("Failed to read template: {0}")]
    Read(String),

    /// Template document has an unexpected shape
    #[error("Invalid template definition: {0}")]
    Invalid(String),

    /// Backend refused a put-template call
    #[error("Failed to put template '{name}': {reason}")]
    Put { name: String, reason: String },

    /// Network failure while installing templates
    #[error("Failed to put template: {0}")]
    Transport(#[from] TransportError),
}
