//! Record-to-index routing.
//!
//! Pure derivation of (index name, document id, routing key) from a record.
//! The document id is stable across re-delivery of the same
//! (partition, sequence) pair, so re-indexing is an idempotent overwrite.

use export_types::{Record, RecordSequence, OWNED_INDEX_DELIMITER};

/// Target of one bulk write, derived deterministically from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAction {
    /// Index the document is written to
    pub index: String,
    /// Stable document id
    pub id: String,
    /// Shard routing key, if any
    pub routing: Option<String>,
}

/// Maps records to write actions. Stateless besides the configured prefix.
#[derive(Debug, Clone)]
pub struct IndexRouter {
    prefix: String,
}

impl IndexRouter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Index name for a record:
    /// `<prefix>_<value-type>_<broker-version>_<yyyy-MM-dd>`.
    ///
    /// The date suffix comes from the record timestamp, so indices roll
    /// daily and the retention policy can age them out individually.
    pub fn index_for(&self, record: &Record) -> String {
        format!(
            "{}{}{}{}{}{}{}",
            self.prefix,
            OWNED_INDEX_DELIMITER,
            record.value_type.as_str(),
            OWNED_INDEX_DELIMITER,
            record.broker_version,
            OWNED_INDEX_DELIMITER,
            record.timestamp.format("%Y-%m-%d"),
        )
    }

    /// Document id for a record sequence: `<partition>-<sequence>`.
    pub fn id_for(&self, sequence: RecordSequence) -> String {
        format!("{}-{}", sequence.partition_id, sequence.sequence)
    }

    /// Routing key pinning all documents of a partition to one shard.
    pub fn routing_for(&self, record: &Record) -> Option<String> {
        Some(record.partition_id.to_string())
    }

    /// Derive the full write action for a record.
    pub fn route(&self, record: &Record, sequence: RecordSequence) -> WriteAction {
        WriteAction {
            index: self.index_for(record),
            id: self.id_for(sequence),
            routing: self.routing_for(record),
        }
    }
}
