//! Normalized clinical records
//!
//! Child rows from either dialect are normalized into these records before
//! feature derivation. They are serialized verbatim into patient documents.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clinical coding systems handled by the crosswalk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodingSystem {
    #[serde(rename = "ICD-9-CM")]
    Icd9Cm,
    #[serde(rename = "SNOMED-CT")]
    SnomedCt,
    #[serde(rename = "ICD-10-CM")]
    Icd10Cm,
}

impl CodingSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodingSystem::Icd9Cm => "ICD-9-CM",
            CodingSystem::SnomedCt => "SNOMED-CT",
            CodingSystem::Icd10Cm => "ICD-10-CM",
        }
    }
}

impl fmt::Display for CodingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition severity, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical category of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Cardiovascular,
    Endocrine,
    Respiratory,
    Renal,
    MentalHealth,
    Musculoskeletal,
    Infectious,
    #[default]
    General,
}

impl ConditionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCategory::Cardiovascular => "cardiovascular",
            ConditionCategory::Endocrine => "endocrine",
            ConditionCategory::Respiratory => "respiratory",
            ConditionCategory::Renal => "renal",
            ConditionCategory::MentalHealth => "mental_health",
            ConditionCategory::Musculoskeletal => "musculoskeletal",
            ConditionCategory::Infectious => "infectious",
            ConditionCategory::General => "general",
        }
    }
}

impl fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cardiovascular" => Ok(ConditionCategory::Cardiovascular),
            "endocrine" => Ok(ConditionCategory::Endocrine),
            "respiratory" => Ok(ConditionCategory::Respiratory),
            "renal" => Ok(ConditionCategory::Renal),
            "mental_health" => Ok(ConditionCategory::MentalHealth),
            "musculoskeletal" => Ok(ConditionCategory::Musculoskeletal),
            "infectious" => Ok(ConditionCategory::Infectious),
            "general" => Ok(ConditionCategory::General),
            _ => Err(format!("Unknown condition category: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionStatus {
    Active,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationStatus {
    Active,
    Discontinued,
}

/// Encounter class used for utilization scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncounterClass {
    Inpatient,
    Emergency,
    Ambulatory,
    Other,
}

impl EncounterClass {
    /// Map a Synthea `ENCOUNTERCLASS` value
    ///
    /// Only the three scored classes match; `wellness`, `outpatient`,
    /// `urgentcare` and the rest are `Other` and do not add to utilization.
    pub fn from_synthea(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "inpatient" => EncounterClass::Inpatient,
            "emergency" => EncounterClass::Emergency,
            "ambulatory" => EncounterClass::Ambulatory,
            _ => EncounterClass::Other,
        }
    }

    /// Map a MIMIC-III `ADMISSION_TYPE` value (every admission is a hospital stay)
    pub fn from_mimic(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "EMERGENCY" | "URGENT" => EncounterClass::Emergency,
            _ => EncounterClass::Inpatient,
        }
    }
}

/// A diagnosis after code resolution and feature derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub source_code: String,
    pub source_vocabulary: CodingSystem,
    pub target_code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_date: Option<NaiveDate>,
    pub status: ConditionStatus,
    pub severity: Severity,
    pub category: ConditionCategory,
}

impl ConditionRecord {
    pub fn is_active(&self) -> bool {
        self.status == ConditionStatus::Active
    }
}

/// A medication order with extracted prescribing details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub status: MedicationStatus,
    pub therapeutic_class: String,
    pub route: String,
    pub frequency: String,
}

/// A single coded measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub code: String,
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_num: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// A visit or admission, only used in aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterRecord {
    pub class: EncounterClass,
    /// Source label (`ENCOUNTERCLASS` or `ADMISSION_TYPE`) used for type counts
    pub kind: String,
    pub cost: f64,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl EncounterRecord {
    /// Length of stay in fractional days, when both ends are known and ordered
    pub fn length_of_stay_days(&self) -> Option<f64> {
        let (start, end) = (self.start?, self.end?);
        let seconds = (end - start).num_seconds();
        if seconds < 0 {
            return None;
        }
        Some(seconds as f64 / 86_400.0)
    }
}
