//! # export-client
//!
//! Memory-bounded batching and chunked bulk writes for the stream export
//! sink.
//!
//! One [`ExportClient`] serves one partition's record stream. The upstream
//! scheduler calls [`ExportClient::index`] for each record, consults
//! [`ExportClient::should_flush`] for backpressure, and decides when to call
//! [`ExportClient::flush`]. Flushing splits the pending batch into
//! byte-bounded chunks and sends one bulk request per chunk, sequentially,
//! failing the whole flush on the first error so the scheduler retries the
//! identical data. Writes are idempotent overwrites by document id, which
//! makes re-sending already-committed chunks safe.

pub mod batch;
pub mod bulk;
pub mod client;
pub mod error;
pub mod router;

pub use batch::PendingBatch;
pub use bulk::{BulkErrorGroup, BulkErrorReport, BulkResponse};
pub use client::{ExportClient, FlushStats};
pub use error::ExportError;
pub use router::{IndexRouter, WriteAction};
