//! # export-types
//!
//! Shared domain types for the stream export sink.
//!
//! This crate defines the core data structures used throughout the exporter:
//! - Records: immutable units produced by the engine's replicated log
//! - Record sequences: per-partition monotonic counters for idempotent ids
//! - Configuration: the full surface consumed by the exporter components
//!
//! ## Usage
//!
//! ```rust
//! use export_types::{Record, RecordSequence, ValueType};
//! ```

pub mod config;
pub mod error;
pub mod record;

pub use config::{
    BulkConfig, ConnectConfig, ExporterConfig, IndexConfig, RetentionConfig, OWNED_INDEX_DELIMITER,
};
pub use error::ConfigError;
pub use record::{Record, RecordSequence, ValueType};
