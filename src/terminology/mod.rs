//! Terminology: code crosswalks and classification tables.
//!
//! Both are read-only for the duration of a run and shared between every
//! stage that needs them. The built-in tables cover the codes and keywords the
//! pipeline ships with; a site can replace any section from a TOML file:
//!
//! ```toml
//! version = "site-2025.1"
//!
//! [crosswalk.snomed_to_icd10]
//! "44054006" = "E11.9"
//!
//! [classification]
//! high_risk_keywords = ["diabetes", "hypertension", "heart", "stroke", "cancer", "copd"]
//!
//! [[classification.care_gaps]]
//! gap_id = "diabetes_without_medication"
//! condition_keyword = "diabetes"
//! treatment_classes = ["Antidiabetic"]
//! ```

pub mod crosswalk;
pub mod tables;

pub use crosswalk::{CodeCrosswalk, CrosswalkTables};
pub use tables::{
    CareGapRule, CategoryRule, ClassificationTables, MedicationClassRule, ReferenceRange,
    RiskFactorRule, SeverityRule,
};

use crate::config::TerminologyConfig;
use crate::domain::{PipelineError, Result};
use serde::Deserialize;
use std::path::Path;

const BUILTIN_VERSION: &str = "builtin";

#[derive(Debug, Deserialize)]
struct TerminologyFile {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    crosswalk: CrosswalkTables,
    #[serde(default)]
    classification: ClassificationTables,
}

/// Crosswalk and classification tables used by one run
#[derive(Debug, Clone)]
pub struct Terminology {
    pub version: String,
    pub crosswalk: CodeCrosswalk,
    pub tables: ClassificationTables,
}

impl Terminology {
    /// The tables compiled into the binary
    pub fn builtin() -> Self {
        Self {
            version: BUILTIN_VERSION.to_string(),
            crosswalk: CodeCrosswalk::default(),
            tables: ClassificationTables::default().normalized(),
        }
    }

    /// Load according to configuration: from `tables_path` when set, else built-in
    pub fn load(config: &TerminologyConfig) -> Result<Self> {
        match config.tables_path.as_deref() {
            Some(path) => Self::from_path(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Load a terminology TOML file
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing, is not valid TOML,
    /// or its tables fail validation.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to read terminology file {}: {}",
                path.display(),
                e
            ))
        })?;
        let file: TerminologyFile = toml::from_str(&contents).map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to parse terminology file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.classification.validate().map_err(|e| {
            PipelineError::Configuration(format!("Invalid terminology tables: {e}"))
        })?;

        let terminology = Self {
            version: file
                .version
                .unwrap_or_else(|| path.display().to_string()),
            crosswalk: CodeCrosswalk::new(file.crosswalk),
            tables: file.classification.normalized(),
        };

        tracing::info!(
            path = %path.display(),
            version = %terminology.version,
            crosswalk_entries = terminology.crosswalk.len(),
            "Loaded terminology tables"
        );

        Ok(terminology)
    }
}

impl Default for Terminology {
    fn default() -> Self {
        Self::builtin()
    }
}
