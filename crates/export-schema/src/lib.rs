//! # export-schema
//!
//! Versioned schema-template management for the stream export sink.
//!
//! The exporter owns one component template per engine version (shared
//! settings and base record mappings) plus one index template per value
//! type, each composed of that version's component template. All names are
//! version-qualified, so an old and a new engine version can create and keep
//! their templates side by side during a rolling upgrade.

pub mod catalog;
pub mod error;
pub mod manager;

pub use catalog::{TemplateCatalog, TemplateDefinition};
pub use error::SchemaError;
pub use manager::SchemaManager;
