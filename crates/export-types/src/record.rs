//! Record types produced by the engine's replicated log.
//!
//! Records are immutable. The exporter only reads them; they live for the
//! duration of one `index()` call plus however long they sit in the pending
//! batch as serialized bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of payload a record carries.
///
/// Each value type maps to its own index family and schema template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    /// Process definition deployed to the engine
    Deployment,
    /// Process instance lifecycle event
    ProcessInstance,
    /// Job created, activated, completed or failed
    Job,
    /// Incident raised or resolved
    Incident,
    /// Variable created or updated
    Variable,
    /// Message published or correlated
    Message,
    /// Timer created or triggered
    Timer,
    /// Decision evaluated
    DecisionEvaluation,
}

impl ValueType {
    /// All value types the exporter knows how to index.
    pub const ALL: &'static [ValueType] = &[
        ValueType::Deployment,
        ValueType::ProcessInstance,
        ValueType::Job,
        ValueType::Incident,
        ValueType::Variable,
        ValueType::Message,
        ValueType::Timer,
        ValueType::DecisionEvaluation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Deployment => "deployment",
            ValueType::ProcessInstance => "process-instance",
            ValueType::Job => "job",
            ValueType::Incident => "incident",
            ValueType::Variable => "variable",
            ValueType::Message => "message",
            ValueType::Timer => "timer",
            ValueType::DecisionEvaluation => "decision-evaluation",
        }
    }

    /// Parse from string, returning None for unknown types.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deployment" => Some(ValueType::Deployment),
            "process-instance" => Some(ValueType::ProcessInstance),
            "job" => Some(ValueType::Job),
            "incident" => Some(ValueType::Incident),
            "variable" => Some(ValueType::Variable),
            "message" => Some(ValueType::Message),
            "timer" => Some(ValueType::Timer),
            "decision-evaluation" => Some(ValueType::DecisionEvaluation),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown value type: {}", s))
    }
}

/// Per-partition monotonically increasing counter assigned by the upstream
/// pipeline.
///
/// Document ids derive from this pair, so re-processing the same record after
/// a crash overwrites the same document instead of duplicating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordSequence {
    pub partition_id: i32,
    pub sequence: u64,
}

impl RecordSequence {
    pub fn new(partition_id: i32, sequence: u64) -> Self {
        Self {
            partition_id,
            sequence,
        }
    }
}

/// An immutable record from the engine's replicated log.
///
/// Owned and produced upstream; the exporter only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Partition the record was written on
    pub partition_id: i32,

    /// Position within the partition's log
    pub position: i64,

    /// Entity key (process instance key, job key, ...)
    pub key: i64,

    /// Kind of payload
    pub value_type: ValueType,

    /// Operation the record represents (e.g. "CREATED", "COMPLETED")
    pub intent: String,

    /// Tenant that owns the record
    pub tenant_id: String,

    /// Engine version that wrote the record
    pub broker_version: String,

    /// Time the record was written, used for the index date suffix
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Type-specific payload, exported verbatim
    pub value: serde_json::Value,
}

impl Record {
    /// Get timestamp as milliseconds since Unix epoch.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}
