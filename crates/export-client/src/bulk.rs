//! Bulk response decoding and item-error aggregation.
//!
//! A bulk call can succeed at the HTTP level while individual items fail
//! (for example on a mapping mismatch). Item errors are grouped by error
//! type with a count and one representative reason so the flush failure
//! stays readable for an operator instead of listing every document.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Response body of a `_bulk` call.
#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    /// True if any item in the request failed
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<BulkItem>,
}

/// One item result; bulk index actions report under the `index` key.
#[derive(Debug, Deserialize)]
pub struct BulkItem {
    #[serde(default)]
    pub index: Option<BulkItemResult>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItemResult {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub reason: String,
}

/// Item errors of one error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkErrorGroup {
    pub error_type: String,
    pub count: usize,
    pub example_reason: String,
}

/// All item errors of one bulk call, grouped by error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkErrorReport {
    pub groups: Vec<BulkErrorGroup>,
}

impl BulkErrorReport {
    /// Group the failed items of a response by error type.
    ///
    /// Returns None when no item carries an error.
    pub fn from_response(response: &BulkResponse) -> Option<Self> {
        let mut by_type: BTreeMap<&str, BulkErrorGroup> = BTreeMap::new();

        for item in &response.items {
            let Some(result) = &item.index else { continue };
            let Some(error) = &result.error else { continue };
            by_type
                .entry(error.error_type.as_str())
                .and_modify(|g| g.count += 1)
                .or_insert_with(|| BulkErrorGroup {
                    error_type: error.error_type.clone(),
                    count: 1,
                    example_reason: error.reason.clone(),
                });
        }

        if by_type.is_empty() {
            None
        } else {
            Some(Self {
                groups: by_type.into_values().collect(),
            })
        }
    }
}

impl std::fmt::Display for BulkErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bulk items failed [")?;
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(
                f,
                "{} x{} (e.g. {})",
                group.error_type, group.count, group.example_reason
            )?;
        }
        write!(f, "]")
    }
}
