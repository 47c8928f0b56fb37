//! Request and response value types for the transport seam.
//!
//! Exporter components describe backend calls as plain [`ApiRequest`] values
//! so the same code runs against HTTP in production and scripted mocks in
//! tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::TransportError;

/// HTTP method of a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// One call against the search backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the backend base URL, starting with '/'
    pub path: String,
    pub body: Option<String>,
    /// MIME type of the body; bulk requests use NDJSON
    pub content_type: &'static str,
}

const JSON: &str = "application/json";
const NDJSON: &str = "application/x-ndjson";

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            content_type: JSON,
        }
    }

    pub fn put(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            body: Some(body.into()),
            content_type: JSON,
        }
    }

    pub fn post(path: impl Into<String>, body: Option<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body,
            content_type: JSON,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
            content_type: JSON,
        }
    }

    /// Bulk write request: NDJSON body posted in one call.
    pub fn bulk(body: String) -> Self {
        Self {
            method: Method::Post,
            path: "/_bulk".to_string(),
            body: Some(body),
            content_type: NDJSON,
        }
    }
}

/// Raw response from the backend.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| TransportError::Response(format!("invalid response body: {}", e)))
    }

    /// Body as text, for error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Capability to execute one backend call.
///
/// The exporter never retries at this level; failed calls surface to the
/// caller and the external scheduler decides when to try again.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
