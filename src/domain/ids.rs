//! Domain identifier types with validation
//!
//! Newtype wrappers keep a source natural key from being mixed up with the
//! derived document id that is sent to the sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Natural key of a patient in its source extract
///
/// `SUBJECT_ID` for MIMIC-III, `Id` for Synthea.
///
/// # Examples
///
/// ```
/// use mediquery::domain::ids::PatientKey;
/// use std::str::FromStr;
///
/// let key = PatientKey::from_str("10006").unwrap();
/// assert_eq!(key.as_str(), "10006");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatientKey(String);

impl PatientKey {
    /// Creates a new PatientKey, trimming surrounding whitespace
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err("Patient key cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PatientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PatientKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a document in the search index
///
/// Writes are idempotent by this id, so it must be a pure function of the
/// source record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new DocumentId
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Document ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
