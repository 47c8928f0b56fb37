//! Abstract retention policy, independent of backend dialect.
//!
//! The state machine has two states. An index starts in `initial` and
//! transitions to `delete` once its age reaches the minimum age; entering
//! `delete` executes a delete action on the index. Both dialects encode
//! exactly this machine.

use serde::{Deserialize, Serialize};

use export_types::{IndexConfig, RetentionConfig};

/// State every managed index starts in.
pub const INITIAL_STATE: &str = "initial";

/// State whose entry action deletes the index.
pub const DELETE_STATE: &str = "delete";

/// Dialect-independent description of the retention policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Policy id on the backend
    pub policy_id: String,

    /// Human-readable description
    pub description: String,

    /// Age at which the `initial` to `delete` transition fires, as a
    /// backend duration string (e.g. "30d")
    pub minimum_age: String,

    /// Pattern scoping the policy to indices this exporter owns
    pub index_pattern: String,
}

impl RetentionPolicy {
    /// Build the policy from the retention and index configuration.
    ///
    /// The scope pattern comes from `IndexConfig::owned_index_pattern()`, so
    /// sibling indices that merely share the literal prefix stay untouched.
    pub fn from_config(retention: &RetentionConfig, index: &IndexConfig) -> Self {
        Self {
            policy_id: retention.policy_name.clone(),
            description: retention.policy_description.clone(),
            minimum_age: retention.minimum_age.clone(),
            index_pattern: index.owned_index_pattern(),
        }
    }
}
