//! Domain models and types for MediQuery.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`PatientKey`], [`DocumentId`])
//! - **Raw rows** ([`RawRow`]) as read from source extracts
//! - **Normalized records** ([`ConditionRecord`], [`MedicationRecord`], ...)
//! - **Index documents** ([`PatientDocument`], [`LabEventDocument`], [`ClinicalNoteDocument`])
//! - **Error types** ([`PipelineError`], [`SourceError`], [`RecordError`], [`SinkError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, PipelineError>`]:
//!
//! ```rust,no_run
//! use mediquery::domain::{PipelineError, Result};
//!
//! fn example() -> Result<()> {
//!     let _config = mediquery::config::load_config("mediquery.toml")?;
//!     Ok(())
//! }
//! ```

pub mod dialect;
pub mod document;
pub mod errors;
pub mod ids;
pub mod records;
pub mod result;
pub mod row;

// Re-export commonly used types for convenience
pub use dialect::Dialect;
pub use document::{
    ClinicalNoteDocument, DataCompleteness, Demographics, DocumentType, EncounterSummary,
    IndexDocument, LabEventDocument, LabInterpretation, LabStatus, PatientDocument, RiskLevel, RiskProfile,
    SinkDocument, SocialDeterminants, Utilization,
};
pub use errors::{PipelineError, RecordError, SinkError, SourceError};
pub use ids::{DocumentId, PatientKey};
pub use records::{
    CodingSystem, ConditionCategory, ConditionRecord, ConditionStatus, EncounterClass,
    EncounterRecord, MedicationRecord, MedicationStatus, ObservationRecord, Severity,
};
pub use result::Result;
pub use row::RawRow;
