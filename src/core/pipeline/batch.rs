//! Batching in front of a document sink
//!
//! Documents are buffered per index and written when the buffer reaches the
//! configured batch size. A failed batch is logged and counted; only an
//! unreachable sink is returned as an error.

use crate::adapters::sink::{BulkIndexResult, DocumentSink};
use crate::domain::{Result, SinkDocument};
use std::sync::Arc;

/// Outcome of the batches written through one [`BatchSink`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Batches handed to the sink (including partially rejected ones)
    pub batches_flushed: u64,
    /// Batches rejected as a whole
    pub batches_failed: u64,
    pub documents_indexed: u64,
    pub documents_failed: u64,
    /// One message per failed batch or rejected document
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch the sink answered for
    pub fn add_success(&mut self, result: &BulkIndexResult) {
        self.batches_flushed += 1;
        self.documents_indexed += result.success_count as u64;
        self.documents_failed += result.failure_count as u64;
        self.errors.extend(
            result
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.document_id, f.error)),
        );
    }

    /// Record a batch rejected as a whole
    pub fn add_failure(&mut self, documents: usize, error: String) {
        self.batches_flushed += 1;
        self.batches_failed += 1;
        self.documents_failed += documents as u64;
        self.errors.push(error);
    }

    /// Merge another batch result into this one
    pub fn merge(&mut self, other: BatchResult) {
        self.batches_flushed += other.batches_flushed;
        self.batches_failed += other.batches_failed;
        self.documents_indexed += other.documents_indexed;
        self.documents_failed += other.documents_failed;
        self.errors.extend(other.errors);
    }
}

/// Buffers documents for one index and writes them in fixed-size batches
pub struct BatchSink {
    sink: Arc<dyn DocumentSink>,
    index: String,
    batch_size: usize,
    dry_run: bool,
    buffer: Vec<SinkDocument>,
    result: BatchResult,
}

impl BatchSink {
    pub fn new(
        sink: Arc<dyn DocumentSink>,
        index: impl Into<String>,
        batch_size: usize,
        dry_run: bool,
    ) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            sink,
            index: index.into(),
            batch_size,
            dry_run,
            buffer: Vec::with_capacity(batch_size),
            result: BatchResult::new(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Documents waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn result(&self) -> &BatchResult {
        &self.result
    }

    /// Buffer a document, flushing when the batch is full
    ///
    /// # Errors
    ///
    /// Returns the sink error only when the sink is unreachable.
    pub async fn submit(&mut self, document: SinkDocument) -> Result<()> {
        self.buffer.push(document);
        if self.buffer.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Write a non-empty remainder
    ///
    /// # Errors
    ///
    /// Returns the sink error only when the sink is unreachable.
    pub async fn finish(&mut self) -> Result<()> {
        self.flush().await
    }

    async fn flush(&mut self) -> Result<()> {
        // The buffer is cleared whatever the outcome
        let documents = std::mem::take(&mut self.buffer);
        if documents.is_empty() {
            return Ok(());
        }
        let size = documents.len();

        if self.dry_run {
            tracing::debug!(index = %self.index, batch_size = size, "Dry run: skipping write");
            self.result.add_success(&BulkIndexResult::all_succeeded(size));
            return Ok(());
        }

        match self.sink.bulk_index(&self.index, documents).await {
            Ok(outcome) => {
                crate::log_batch_flush!(self.index, size, outcome.success_count);
                if outcome.failure_count > 0 {
                    tracing::warn!(
                        index = %self.index,
                        batch_size = size,
                        failed = outcome.failure_count,
                        throttled = outcome.failures.iter().filter(|f| f.is_throttled).count(),
                        "Batch partially rejected"
                    );
                }
                self.result.add_success(&outcome);
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                self.result.add_failure(size, e.to_string());
                Err(e)
            }
            Err(e) => {
                tracing::error!(
                    index = %self.index,
                    batch_size = size,
                    error = %e,
                    "Batch write failed, continuing"
                );
                self.result.add_failure(size, e.to_string());
                Ok(())
            }
        }
    }
}
