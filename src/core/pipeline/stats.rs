//! Run statistics
//!
//! One [`RunStatistics`] value belongs to one pipeline run. Shards of a
//! larger run each keep their own and are combined with
//! [`RunStatistics::merge`].

use super::batch::BatchResult;
use crate::domain::{Dialect, PipelineError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Counters for one ingest run
#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Documents assembled and handed to a batch
    pub processed: u64,

    /// Rows that were malformed or failed assembly
    pub errors: u64,

    /// Rows deliberately dropped (empty lab values, empty notes)
    pub filtered: u64,

    /// Streams not ingested because their table was missing
    pub sources_skipped: Vec<String>,

    pub batches_flushed: u64,
    pub batches_failed: u64,
    pub documents_indexed: u64,
    pub documents_failed: u64,

    /// A shutdown signal stopped the run early
    pub interrupted: bool,

    /// Per-stage counts keyed `<dialect>.<stage>`
    pub stage_counts: BTreeMap<String, u64>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            processed: 0,
            errors: 0,
            filtered: 0,
            sources_skipped: Vec::new(),
            batches_flushed: 0,
            batches_failed: 0,
            documents_indexed: 0,
            documents_failed: 0,
            interrupted: false,
            stage_counts: BTreeMap::new(),
        }
    }

    pub fn count_stage(&mut self, dialect: Dialect, stage: &str, count: u64) {
        if count == 0 {
            return;
        }
        *self
            .stage_counts
            .entry(format!("{}.{stage}", dialect.as_str()))
            .or_insert(0) += count;
    }

    pub fn stage(&self, dialect: Dialect, stage: &str) -> u64 {
        self.stage_counts
            .get(&format!("{}.{stage}", dialect.as_str()))
            .copied()
            .unwrap_or(0)
    }

    pub fn skip_source(&mut self, name: impl Into<String>) {
        self.sources_skipped.push(name.into());
    }

    /// Fold in the outcome of one index's batches
    pub fn record_batches(&mut self, batches: &BatchResult) {
        self.batches_flushed += batches.batches_flushed;
        self.batches_failed += batches.batches_failed;
        self.documents_indexed += batches.documents_indexed;
        self.documents_failed += batches.documents_failed;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// No row errors and no rejected documents
    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.documents_failed == 0
    }

    /// Indexed share of processed documents, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 100.0;
        }
        (self.documents_indexed as f64 / self.processed as f64) * 100.0
    }

    pub fn duration_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Combine statistics from another shard of the same run
    pub fn merge(&mut self, other: RunStatistics) {
        self.started_at = self.started_at.min(other.started_at);
        self.finished_at = match (self.finished_at, other.finished_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.processed += other.processed;
        self.errors += other.errors;
        self.filtered += other.filtered;
        self.sources_skipped.extend(other.sources_skipped);
        self.batches_flushed += other.batches_flushed;
        self.batches_failed += other.batches_failed;
        self.documents_indexed += other.documents_indexed;
        self.documents_failed += other.documents_failed;
        self.interrupted |= other.interrupted;
        for (stage, count) in other.stage_counts {
            *self.stage_counts.entry(stage).or_insert(0) += count;
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            processed = self.processed,
            errors = self.errors,
            filtered = self.filtered,
            documents_indexed = self.documents_indexed,
            documents_failed = self.documents_failed,
            batches_flushed = self.batches_flushed,
            batches_failed = self.batches_failed,
            interrupted = self.interrupted,
            duration_secs = self.duration_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Ingest run finished"
        );

        for source in &self.sources_skipped {
            tracing::warn!(source = %source, "Source skipped");
        }
        for (stage, count) in &self.stage_counts {
            tracing::debug!(stage = %stage, count = count, "Stage count");
        }
    }
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// A run stopped by a fatal error, with everything counted until then
#[derive(Debug, Error)]
#[error("Ingest run aborted: {cause}")]
pub struct RunAborted {
    pub statistics: RunStatistics,
    #[source]
    pub cause: PipelineError,
}

impl RunAborted {
    pub fn new(mut statistics: RunStatistics, cause: PipelineError) -> Self {
        statistics.finish();
        Self { statistics, cause }
    }
}
