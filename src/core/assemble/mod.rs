//! Document assembly
//!
//! Turns one raw primary row plus its joined child rows into a canonical
//! document. Assembly never aborts the run: a row either produces a document
//! or an explicit [`AssembleOutcome::Skipped`] carrying the reason.
//!
//! Two dialects are supported:
//!
//! - **MIMIC-III**: patients, lab events and clinical notes
//! - **Synthea**: patients with encounters, conditions, medications and
//!   observations

pub mod identity;
pub mod mimic;
pub mod narrative;
pub mod synthea;

use crate::domain::RecordError;
use chrono::{DateTime, NaiveDate, Utc};

pub use identity::{anonymized_id, patient_document_id};

/// Oldest age accepted for a patient
pub const MAX_AGE_YEARS: i64 = 120;

/// Per-run parameters shared by every assembled document
#[derive(Debug, Clone)]
pub struct AssemblyContext {
    /// Age is computed against this date for living patients
    pub reference_date: NaiveDate,
    pub anonymize: bool,
    /// Hex characters of the digest kept in anonymized ids
    pub id_digest_len: usize,
    /// Processing time stamped on every document
    pub timestamp: DateTime<Utc>,
}

impl AssemblyContext {
    pub fn new(reference_date: NaiveDate, anonymize: bool, id_digest_len: usize) -> Self {
        Self {
            reference_date,
            anonymize,
            id_digest_len,
            timestamp: Utc::now(),
        }
    }
}

/// Result of assembling one row
#[derive(Debug)]
pub enum AssembleOutcome<T> {
    Assembled(T),
    Skipped(SkipReason),
}

impl<T> AssembleOutcome<T> {
    pub fn is_assembled(&self) -> bool {
        matches!(self, AssembleOutcome::Assembled(_))
    }

    pub fn assembled(self) -> Option<T> {
        match self {
            AssembleOutcome::Assembled(doc) => Some(doc),
            AssembleOutcome::Skipped(_) => None,
        }
    }
}

/// Why a row produced no document
#[derive(Debug)]
pub enum SkipReason {
    /// The row is unusable; counted as an error
    Invalid(RecordError),
    /// The row carries nothing worth indexing (empty lab value, empty note)
    Filtered(&'static str),
}

impl SkipReason {
    pub fn is_error(&self) -> bool {
        matches!(self, SkipReason::Invalid(_))
    }
}

impl From<RecordError> for SkipReason {
    fn from(err: RecordError) -> Self {
        SkipReason::Invalid(err)
    }
}

/// Whole years between two dates, counting 365-day years
pub fn age_in_years(birth: NaiveDate, end: NaiveDate) -> i64 {
    (end - birth).num_days().div_euclid(365)
}

/// Age at death, or at the reference date, within `0..=120`
pub fn validated_age(
    key: &str,
    birth: Option<NaiveDate>,
    death: Option<NaiveDate>,
    reference_date: NaiveDate,
) -> Result<u32, RecordError> {
    let birth = birth.ok_or_else(|| RecordError::InvalidAge {
        key: key.to_string(),
        detail: "birth date missing or unparseable".to_string(),
    })?;
    let age = age_in_years(birth, death.unwrap_or(reference_date));
    if !(0..=MAX_AGE_YEARS).contains(&age) {
        return Err(RecordError::InvalidAge {
            key: key.to_string(),
            detail: format!("computed age {age} outside 0..={MAX_AGE_YEARS}"),
        });
    }
    u32::try_from(age).map_err(|e| RecordError::InvalidAge {
        key: key.to_string(),
        detail: e.to_string(),
    })
}
