//! Error types for retention management.

use thiserror::Error;

use export_transport::TransportError;

/// Errors raised while managing the retention policy.
#[derive(Error, Debug)]
pub enum RetentionError {
    /// Network failure while reaching the backend
    #[error("Failed to reach backend: {0}")]
    Transport(#[from] TransportError),

    /// Optimistic-concurrency token was stale; the caller must re-fetch the
    /// current policy state before retrying
    #[error("Concurrency conflict updating policy '{policy_id}': policy was modified concurrently")]
    ConcurrencyConflict { policy_id: String },

    /// Backend refused a policy operation
    #[error("Failed to {operation} retention policy: status {status}: {reason}")]
    Backend {
        operation: &'static str,
        status: u16,
        reason: String,
    },

    /// Response body could not be interpreted
    #[error("Invalid retention response: {0}")]
    Response(String),
}
