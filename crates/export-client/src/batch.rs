//! Pending batch of not-yet-flushed bulk entries.
//!
//! Entries are kept in insertion order, keyed by document id, with exact
//! wire-size accounting: the tracked byte count is the length of the NDJSON
//! the backend will receive (metadata line plus document line), which the
//! chunking algorithm relies on to bound each outgoing request.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::ExportError;
use crate::router::WriteAction;

/// Metadata line of one bulk index action.
#[derive(Debug, Serialize)]
struct IndexActionMeta<'a> {
    index: IndexActionTarget<'a>,
}

#[derive(Debug, Serialize)]
struct IndexActionTarget<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id")]
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    routing: Option<&'a str>,
}

/// One serialized bulk entry: metadata line + document line, both
/// newline-terminated.
#[derive(Debug, Clone)]
pub struct BulkEntry {
    pub document_id: String,
    pub serialized: String,
}

impl BulkEntry {
    /// Exact wire size of this entry in bytes.
    pub fn len(&self) -> usize {
        self.serialized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serialized.is_empty()
    }
}

/// In-memory accumulator of pending write actions.
///
/// At most one entry per document id; duplicates are first-write-wins and
/// do not grow the batch. Iteration order for flushing is insertion order.
#[derive(Debug, Default)]
pub struct PendingBatch {
    entries: Vec<BulkEntry>,
    ids: HashSet<String>,
    memory_usage_bytes: usize,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a serialized record under its document id if absent.
    ///
    /// Returns whether a new entry was added. A repeated document id is a
    /// no-op, even with different payload content: the first write wins and
    /// `size()`/`memory_usage_bytes()` stay unchanged.
    pub fn index(
        &mut self,
        action: &WriteAction,
        document: &serde_json::Value,
    ) -> Result<bool, ExportError> {
        if self.ids.contains(&action.id) {
            return Ok(false);
        }

        let meta = IndexActionMeta {
            index: IndexActionTarget {
                index: &action.index,
                id: &action.id,
                routing: action.routing.as_deref(),
            },
        };
        let mut serialized = serde_json::to_string(&meta)?;
        serialized.push('\n');
        serialized.push_str(&serde_json::to_string(document)?);
        serialized.push('\n');

        self.memory_usage_bytes += serialized.len();
        self.ids.insert(action.id.clone());
        self.entries.push(BulkEntry {
            document_id: action.id.clone(),
            serialized,
        });
        Ok(true)
    }

    /// Number of pending entries.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Exact sum of the serialized sizes of all pending entries.
    pub fn memory_usage_bytes(&self) -> usize {
        self.memory_usage_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Atomically empty the batch and reset memory usage to zero.
    ///
    /// Called only after a flush fully succeeds; on any failure the batch
    /// stays unchanged so the identical entries are retried as-is.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.ids.clear();
        self.memory_usage_bytes = 0;
    }

    /// Partition the pending entries, in insertion order, into consecutive
    /// chunks whose cumulative serialized size stays at or below
    /// `memory_limit`.
    ///
    /// A single entry larger than the limit still forms its own chunk and is
    /// sent alone; data is never silently dropped.
    pub fn chunks(&self, memory_limit: usize) -> Vec<&[BulkEntry]> {
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut bytes = 0;

        for (i, entry) in self.entries.iter().enumerate() {
            if i > start && bytes + entry.len() > memory_limit {
                chunks.push(&self.entries[start..i]);
                start = i;
                bytes = 0;
            }
            bytes += entry.len();
        }
        if start < self.entries.len() {
            chunks.push(&self.entries[start..]);
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: &str) -> WriteAction {
        WriteAction {
            index: "flow-record_job_8.7.0_2024-01-01".to_string(),
            id: id.to_string(),
            routing: Some("1".to_string()),
        }
    }

    #[test]
    fn test_index_adds_entry() {
        let mut batch = PendingBatch::new();
        let added = batch
            .index(&action("1-1"), &serde_json::json!({"a": 1}))
            .unwrap();
        assert!(added);
        assert_eq!(batch.size(), 1);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_duplicate_id_is_noop() {
        let mut batch = PendingBatch::new();
        batch
            .index(&action("1-1"), &serde_json::json!({"a": 1}))
            .unwrap();
        let size = batch.size();
        let bytes = batch.memory_usage_bytes();

        // Different payload, same id: first write wins.
        let added = batch
            .index(&action("1-1"), &serde_json::json!({"a": 2, "b": "bigger"}))
            .unwrap();
        assert!(!added);
        assert_eq!(batch.size(), size);
        assert_eq!(batch.memory_usage_bytes(), bytes);
    }

    #[test]
    fn test_memory_usage_is_exact_wire_size() {
        let mut batch = PendingBatch::new();
        let doc = serde_json::json!({"a": 1});
        batch.index(&action("1-1"), &doc).unwrap();

        let meta = r#"{"index":{"_index":"flow-record_job_8.7.0_2024-01-01","_id":"1-1","routing":"1"}}"#;
        let expected = meta.len() + 1 + doc.to_string().len() + 1;
        assert_eq!(batch.memory_usage_bytes(), expected);

        batch.index(&action("1-2"), &doc).unwrap();
        assert_eq!(batch.memory_usage_bytes(), 2 * expected);
    }

    #[test]
    fn test_metadata_omits_missing_routing() {
        let mut batch = PendingBatch::new();
        let no_routing = WriteAction {
            routing: None,
            ..action("1-1")
        };
        batch.index(&no_routing, &serde_json::json!({})).unwrap();
        assert!(!batch.entries[0].serialized.contains("routing"));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut batch = PendingBatch::new();
        batch
            .index(&action("1-1"), &serde_json::json!({"a": 1}))
            .unwrap();
        batch
            .index(&action("1-2"), &serde_json::json!({"a": 2}))
            .unwrap();

        batch.clear();
        assert_eq!(batch.size(), 0);
        assert_eq!(batch.memory_usage_bytes(), 0);
        assert!(batch.is_empty());

        // Ids are reusable after clear.
        let added = batch
            .index(&action("1-1"), &serde_json::json!({"a": 1}))
            .unwrap();
        assert!(added);
    }

    #[test]
    fn test_chunks_respect_memory_limit() {
        let mut batch = PendingBatch::new();
        for i in 0..3 {
            batch
                .index(&action(&format!("1-{}", i)), &serde_json::json!({"n": i}))
                .unwrap();
        }
        let entry_len = batch.entries[0].len();

        // Limit slightly above two entries: expect a chunk of 2 then 1.
        let chunks = batch.chunks(2 * entry_len + 1);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2);
        assert_eq!(chunks[1].len(), 1);
    }

    #[test]
    fn test_chunks_preserve_insertion_order() {
        let mut batch = PendingBatch::new();
        for i in 0..5 {
            batch
                .index(&action(&format!("1-{}", i)), &serde_json::json!({"n": i}))
                .unwrap();
        }
        let chunks = batch.chunks(batch.entries[0].len() * 2);
        let flattened: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.iter().map(|e| e.document_id.as_str()))
            .collect();
        assert_eq!(flattened, vec!["1-0", "1-1", "1-2", "1-3", "1-4"]);
    }

    #[test]
    fn test_oversized_entry_gets_own_chunk() {
        let mut batch = PendingBatch::new();
        let big = serde_json::json!({"payload": "x".repeat(1024)});
        batch.index(&action("1-0"), &big).unwrap();
        batch
            .index(&action("1-1"), &serde_json::json!({"n": 1}))
            .unwrap();

        // Limit below even the small entry: every entry ships alone.
        let chunks = batch.chunks(8);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 1);
        assert_eq!(chunks[1].len(), 1);
    }

    #[test]
    fn test_chunks_of_empty_batch() {
        let batch = PendingBatch::new();
        assert!(batch.chunks(1024).is_empty());
    }
}
