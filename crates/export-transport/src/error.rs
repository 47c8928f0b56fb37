//! Error types for the transport seam.

use thiserror::Error;

/// Errors that can occur while reaching the search backend.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Client could not be constructed from the connection settings
    #[error("Connection error: {0}")]
    Connect(String),

    /// Network or I/O failure while executing a request
    #[error("Request error: {0}")]
    Request(String),

    /// Response body could not be decoded
    #[error("Response error: {0}")]
    Response(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() || err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::Request("connection reset".to_string());
        assert_eq!(err.to_string(), "Request error: connection reset");

        let err = TransportError::Response("invalid json".to_string());
        assert_eq!(err.to_string(), "Response error: invalid json");
    }
}
