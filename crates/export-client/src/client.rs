//! Export client: accepts records, advises on flushing, performs the
//! chunked bulk flush.
//!
//! Single-writer model: one client serves one partition's record stream and
//! is never called concurrently. Flushing is fail-stop: the first chunk that
//! fails aborts the flush and leaves the whole batch pending, including
//! chunks already committed in this attempt. Re-sending them next time is a
//! correctness-preserving no-op because writes overwrite by document id.

use std::sync::Arc;

use tracing::{debug, info};

use export_transport::{ApiRequest, SearchTransport};
use export_types::{BulkConfig, ExporterConfig, Record, RecordSequence};

use crate::batch::PendingBatch;
use crate::bulk::{BulkErrorReport, BulkResponse};
use crate::error::ExportError;
use crate::router::IndexRouter;

/// Outcome of one successful flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Bulk requests issued
    pub chunks: usize,
    /// Documents committed
    pub documents: usize,
    /// Serialized bytes sent
    pub bytes: usize,
}

impl FlushStats {
    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }
}

/// Orchestrates batching and bulk writes for one partition.
pub struct ExportClient {
    transport: Arc<dyn SearchTransport>,
    router: IndexRouter,
    batch: PendingBatch,
    bulk: BulkConfig,
}

impl ExportClient {
    pub fn new(config: &ExporterConfig, transport: Arc<dyn SearchTransport>) -> Self {
        Self {
            transport,
            router: IndexRouter::new(config.index.prefix.clone()),
            batch: PendingBatch::new(),
            bulk: config.bulk.clone(),
        }
    }

    /// Accept a record into the pending batch.
    ///
    /// Returns whether a new entry was added; re-delivery of an already
    /// pending (partition, sequence) pair is a no-op.
    pub fn index(
        &mut self,
        record: &Record,
        sequence: RecordSequence,
    ) -> Result<bool, ExportError> {
        let action = self.router.route(record, sequence);
        let added = self.batch.index(&action, &record.value)?;
        if added {
            debug!(
                document_id = %action.id,
                index = %action.index,
                pending = self.batch.size(),
                "Buffered record"
            );
        } else {
            debug!(document_id = %action.id, "Duplicate record sequence, already pending");
        }
        Ok(added)
    }

    /// Advisory only: true once either the memory or the count limit is
    /// reached. The external scheduler decides when flush actually runs.
    pub fn should_flush(&self) -> bool {
        self.batch.memory_usage_bytes() >= self.bulk.memory_limit
            || self.batch.size() >= self.bulk.size
    }

    /// Number of pending records.
    pub fn pending_size(&self) -> usize {
        self.batch.size()
    }

    /// Serialized bytes currently pending.
    pub fn pending_bytes(&self) -> usize {
        self.batch.memory_usage_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Flush the pending batch as one bulk request per byte-bounded chunk,
    /// sequentially and in insertion order.
    ///
    /// On any transport failure or item-level error the flush raises
    /// immediately, no further chunks are sent, and the batch is left
    /// untouched so the next attempt retries the identical data. The batch
    /// is cleared exactly once, after every chunk succeeded.
    pub async fn flush(&mut self) -> Result<FlushStats, ExportError> {
        if self.batch.is_empty() {
            return Ok(FlushStats::default());
        }

        let mut stats = FlushStats::default();
        let chunks = self.batch.chunks(self.bulk.memory_limit);
        let total_chunks = chunks.len();

        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut body = String::with_capacity(chunk.iter().map(|e| e.len()).sum());
            for entry in chunk {
                body.push_str(&entry.serialized);
            }
            let body_len = body.len();

            debug!(
                chunk = i + 1,
                total_chunks,
                documents = chunk.len(),
                bytes = body_len,
                "Sending bulk chunk"
            );

            let response = self.transport.execute(ApiRequest::bulk(body)).await?;
            if !response.is_success() {
                return Err(ExportError::Rejected {
                    status: response.status,
                    body: response.text(),
                });
            }

            let bulk_response: BulkResponse = response
                .json()
                .map_err(|e| ExportError::InvalidResponse(e.to_string()))?;
            if bulk_response.errors {
                // The errors flag alone fails the flush even if the item
                // details cannot be extracted.
                let report = BulkErrorReport::from_response(&bulk_response)
                    .unwrap_or(BulkErrorReport { groups: Vec::new() });
                return Err(ExportError::ItemErrors(report));
            }

            stats.chunks += 1;
            stats.documents += chunk.len();
            stats.bytes += body_len;
        }

        self.batch.clear();
        info!(
            chunks = stats.chunks,
            documents = stats.documents,
            bytes = stats.bytes,
            "Flushed bulk"
        );
        Ok(stats)
    }
}
