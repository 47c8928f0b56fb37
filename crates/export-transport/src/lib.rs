//! # export-transport
//!
//! The "send request" capability consumed by every exporter component.
//!
//! Components build [`ApiRequest`] values describing backend calls and hand
//! them to a [`SearchTransport`]. The production implementation is
//! [`HttpTransport`] (reqwest); tests substitute scripted mocks.

pub mod error;
pub mod http;
pub mod request;

pub use error::TransportError;
pub use http::HttpTransport;
pub use request::{ApiRequest, ApiResponse, Method, SearchTransport};
