//! Error types for the export client.

use thiserror::Error;

use export_transport::TransportError;

use crate::bulk::BulkErrorReport;

/// Errors that can occur while indexing or flushing records.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Network or I/O failure while sending a bulk chunk
    #[error("Failed to flush bulk: {0}")]
    Transport(#[from] TransportError),

    /// Backend rejected a bulk request as a whole
    #[error("Failed to flush bulk: backend returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Backend accepted the request but one or more items failed
    #[error("Failed to flush bulk: {0}")]
    ItemErrors(BulkErrorReport),

    /// Bulk response body could not be decoded
    #[error("Failed to flush bulk: invalid response: {0}")]
    InvalidResponse(String),

    /// A record could not be serialized into a bulk entry
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_message() {
        let err = ExportError::Transport(TransportError::Request("timed out".to_string()));
        assert!(err.to_string().contains("Failed to flush bulk"));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_rejected_message() {
        let err = ExportError::Rejected {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert!(err.to_string().contains("Failed to flush bulk"));
        assert!(err.to_string().contains("503"));
    }
}
