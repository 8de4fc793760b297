//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Console output filtered by `RUST_LOG` or the configured level
//! - Optional JSON log files with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use mediquery::logging::init_logging;
//! use mediquery::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(dialect = "mimic", "Ingest started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a batch handed to the sink
///
/// # Example
///
/// ```no_run
/// use mediquery::log_batch_flush;
///
/// log_batch_flush!("patients", 1000, 998);
/// ```
#[macro_export]
macro_rules! log_batch_flush {
    ($index:expr, $size:expr, $indexed:expr) => {
        tracing::debug!(
            index = %$index,
            batch_size = $size,
            indexed = $indexed,
            failed = ($size - $indexed),
            "Flushed batch"
        );
    };
}

/// Log a primary row that produced no document
///
/// # Example
///
/// ```no_run
/// use mediquery::log_record_skipped;
///
/// log_record_skipped!("mimic", Some(42u64), "Invalid age for 10006: 121 years");
/// ```
#[macro_export]
macro_rules! log_record_skipped {
    ($dialect:expr, $line:expr, $reason:expr) => {
        tracing::warn!(
            dialect = %$dialect,
            line = ?$line,
            reason = %$reason,
            "Skipped record"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use mediquery::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "bulk request returned 429 Too Many Requests");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
