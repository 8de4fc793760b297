//! Document sink abstraction
//!
//! This module defines the trait that every document sink implements so the
//! pipeline can write to Elasticsearch or to local files interchangeably.

use crate::domain::{Result, SinkDocument};
use async_trait::async_trait;

/// Result of a bulk index operation
#[derive(Debug, Clone, Default)]
pub struct BulkIndexResult {
    /// Number of documents the sink accepted
    pub success_count: usize,

    /// Number of documents the sink rejected
    pub failure_count: usize,

    /// Details of rejected documents
    pub failures: Vec<BulkIndexFailure>,
}

impl BulkIndexResult {
    /// Every document accepted
    pub fn all_succeeded(count: usize) -> Self {
        Self {
            success_count: count,
            failure_count: 0,
            failures: Vec::new(),
        }
    }

    pub fn add_failure(&mut self, failure: BulkIndexFailure) {
        self.failure_count += 1;
        self.failures.push(failure);
    }
}

/// Details of a rejected document
#[derive(Debug, Clone)]
pub struct BulkIndexFailure {
    /// Document ID that failed
    pub document_id: String,

    /// Error message reported by the sink
    pub error: String,

    /// Whether the failure was due to throttling (429)
    pub is_throttled: bool,
}

/// Destination for assembled documents
///
/// Writes are idempotent by document id: indexing the same id twice replaces
/// the earlier document.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Short name used in logs (`elasticsearch`, `ndjson`)
    fn name(&self) -> &str;

    /// Check that the sink can be reached
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Unreachable` if the sink cannot be contacted.
    async fn test_connection(&self) -> Result<()>;

    /// Write a batch of documents to one index
    ///
    /// Per-document rejections are reported in the returned
    /// [`BulkIndexResult`]; only whole-request failures are errors.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Unreachable` when the sink is gone and
    /// `SinkError::WriteFailed` when the whole request was rejected.
    async fn bulk_index(&self, index: &str, documents: Vec<SinkDocument>)
        -> Result<BulkIndexResult>;
}
