//! Domain error types
//!
//! This module defines the error hierarchy for MediQuery. Errors are split by the
//! stage that raises them so the pipeline can decide, per variant, whether a
//! failure is skipped, counted, or aborts the run.

use thiserror::Error;

/// Main MediQuery error type
///
/// This is the primary error type used throughout the application.
/// It wraps stage-specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source extract errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Per-record assembly errors
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Document sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Whether this error must abort the whole run
    ///
    /// Only an unreachable sink and a broken configuration are fatal. Everything
    /// else is scoped to a record, a batch, or a source stream.
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::Configuration(_) => true,
            PipelineError::Sink(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Errors raised while reading source extracts
#[derive(Debug, Error)]
pub enum SourceError {
    /// A required table is missing or unreadable
    #[error("Source table {table} unavailable at {path}")]
    Unavailable { table: String, path: String },

    /// A row could not be decoded
    #[error("Malformed row in {table} at line {line}: {message}")]
    MalformedRow {
        table: String,
        line: u64,
        message: String,
    },

    /// Underlying read failure
    #[error("Failed to read source: {0}")]
    Io(String),
}

/// Errors raised while assembling a single document
#[derive(Debug, Error)]
pub enum RecordError {
    /// Birth date missing, unparseable, or age outside the accepted range
    #[error("Invalid age for {key}: {detail}")]
    InvalidAge { key: String, detail: String },

    /// A required field is absent
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The assembled document could not be serialized
    #[error("Failed to serialize document {id}: {message}")]
    Serialization { id: String, message: String },
}

/// Document sink errors
///
/// These errors don't expose the HTTP client types.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink cannot be reached at all
    #[error("Sink unreachable: {0}")]
    Unreachable(String),

    /// A bulk write was rejected as a whole
    #[error("Bulk write failed: {0}")]
    WriteFailed(String),

    /// The sink answered with something we could not interpret
    #[error("Invalid response from sink: {0}")]
    InvalidResponse(String),

    /// Throttled by the sink (429 / 503)
    #[error("Sink throttled request: {0}")]
    Throttled(String),
}

impl SinkError {
    /// Only connectivity loss is fatal; anything else is a per-batch failure
    pub fn is_fatal(&self) -> bool {
        matches!(self, SinkError::Unreachable(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        PipelineError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv errors that happen outside a row (open, headers)
impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Source(SourceError::Io(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_source_error_conversion() {
        let source_err = SourceError::Unavailable {
            table: "PATIENTS".to_string(),
            path: "/data/PATIENTS.csv".to_string(),
        };
        let err: PipelineError = source_err.into();
        assert!(matches!(err, PipelineError::Source(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_malformed_row_display() {
        let err = SourceError::MalformedRow {
            table: "patients".to_string(),
            line: 7,
            message: "found record with 3 fields".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed row in patients at line 7: found record with 3 fields"
        );
    }

    #[test]
    fn test_sink_unreachable_is_fatal() {
        let err: PipelineError = SinkError::Unreachable("connection refused".to_string()).into();
        assert!(err.is_fatal());

        let err: PipelineError = SinkError::WriteFailed("400".to_string()).into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_record_error_is_not_fatal() {
        let err: PipelineError = RecordError::InvalidAge {
            key: "10006".to_string(),
            detail: "age 300 outside 0..=120".to_string(),
        }
        .into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: PipelineError = json_err.into();
        assert!(matches!(err, PipelineError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: PipelineError = toml_err.into();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_pipeline_error_implements_std_error() {
        let err = PipelineError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
