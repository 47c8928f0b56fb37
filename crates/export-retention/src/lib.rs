//! # export-retention
//!
//! Age-based index deletion for the stream export sink.
//!
//! One abstract state machine (an index moves from `initial` to `delete`
//! once it is older than the configured minimum age, and entering `delete`
//! removes it) with two backend-specific encodings: ILM phases and ISM
//! states/transitions/actions. The business logic lives once in
//! [`RetentionPolicyManager`]; the dialects only translate it to requests
//! and documents.

pub mod dialect;
pub mod error;
pub mod manager;
pub mod policy;

pub use dialect::{IlmDialect, IsmDialect, RetentionDialect};
pub use error::RetentionError;
pub use manager::{ConcurrencyToken, RetentionPolicyManager};
pub use policy::{RetentionPolicy, DELETE_STATE, INITIAL_STATE};
