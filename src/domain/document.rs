//! Index documents
//!
//! The canonical document model written to the search index. Every document
//! carries `id`, `type`, `source`, `timestamp`, `title` and `summary`; the rest
//! of the shape depends on the document type.

use super::errors::RecordError;
use super::ids::DocumentId;
use super::records::{ConditionRecord, MedicationRecord, ObservationRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Patient,
    LabResult,
    ClinicalNote,
}

/// Three-level scale shared by risk and utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    pub utilization_score: u32,
    pub risk_level: RiskLevel,
    pub inpatient_visits: u32,
    pub emergency_visits: u32,
    pub outpatient_visits: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EncounterSummary {
    pub total_encounters: usize,
    pub encounter_types: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_length_of_stay_days: Option<f64>,
    pub total_healthcare_cost: f64,
    pub avg_cost_per_encounter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialDeterminants {
    pub income_level: String,
    pub insurance_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCompleteness {
    pub score: u32,
    pub missing_fields: Vec<String>,
    pub condition_count: usize,
    pub medication_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PersonName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub first: String,
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maiden: Option<String>,
}

impl PersonName {
    pub fn full(&self) -> String {
        format!("{} {}", self.first, self.last).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthplace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Financial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcare_expenses: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcare_coverage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
}

/// Direct identifiers, dropped entirely when anonymizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Identifiers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drivers_license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: u32,
    pub gender: String,
    pub deceased: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<PersonName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial: Option<Financial>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<Identifiers>,
}

impl Demographics {
    /// Minimal demographics; dialect assemblers fill in the optional parts
    pub fn new(age: u32, gender: impl Into<String>) -> Self {
        Self {
            age,
            gender: gender.into(),
            deceased: false,
            birth_date: None,
            death_date: None,
            ethnicity: None,
            race: None,
            marital_status: None,
            name: None,
            location: None,
            financial: None,
            identifiers: None,
        }
    }
}

/// One patient with everything derived from their child records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDocument {
    pub id: DocumentId,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub source: String,
    /// Natural key, only kept when not anonymizing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
    pub demographics: Demographics,
    pub conditions: Vec<ConditionRecord>,
    pub medications: Vec<MedicationRecord>,
    pub vital_signs: Vec<ObservationRecord>,
    pub lab_results: Vec<ObservationRecord>,
    pub encounters_summary: EncounterSummary,
    pub utilization: Utilization,
    pub risk_profile: RiskProfile,
    pub clinical_risk_factors: Vec<String>,
    pub complexity_score: f64,
    pub care_gaps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_determinants: Option<SocialDeterminants>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_completeness: Option<DataCompleteness>,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub summary: String,
}

/// Outcome of comparing a lab value with its reference range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabStatus {
    Normal,
    Low,
    High,
    CriticalLow,
    CriticalHigh,
    /// No reference range known for this test
    Unknown,
    /// The value is not numeric
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabInterpretation {
    pub status: LabStatus,
    pub interpretation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
}

/// One MIMIC-III `LABEVENTS` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabEventDocument {
    pub id: DocumentId,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub source: String,
    pub patient_id: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_id: Option<String>,
    pub item_id: String,
    pub test_name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_num: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_time: Option<NaiveDateTime>,
    pub interpretation: LabInterpretation,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub summary: String,
}

/// One MIMIC-III `NOTEEVENTS` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalNoteDocument {
    pub id: DocumentId,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub source: String,
    pub patient_id: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_id: Option<String>,
    pub category: String,
    pub description: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_date: Option<NaiveDate>,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub summary: String,
}

/// A document as handed to a sink: its id and serialized body
#[derive(Debug, Clone, PartialEq)]
pub struct SinkDocument {
    pub id: String,
    pub body: serde_json::Value,
}

/// Anything that can be written to the index
pub trait IndexDocument: Serialize {
    fn document_id(&self) -> &DocumentId;

    /// Serialize into the `{id, body}` pair accepted by sinks
    fn to_sink_document(&self) -> Result<SinkDocument, RecordError> {
        let body = serde_json::to_value(self).map_err(|e| RecordError::Serialization {
            id: self.document_id().to_string(),
            message: e.to_string(),
        })?;
        Ok(SinkDocument {
            id: self.document_id().to_string(),
            body,
        })
    }
}

impl IndexDocument for PatientDocument {
    fn document_id(&self) -> &DocumentId {
        &self.id
    }
}

impl IndexDocument for LabEventDocument {
    fn document_id(&self) -> &DocumentId {
        &self.id
    }
}

impl IndexDocument for ClinicalNoteDocument {
    fn document_id(&self) -> &DocumentId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> ClinicalNoteDocument {
        ClinicalNoteDocument {
            id: DocumentId::new("note_1").unwrap(),
            doc_type: DocumentType::ClinicalNote,
            source: "MIMIC-III".to_string(),
            patient_id: DocumentId::new("pat_0a1b2c3d").unwrap(),
            admission_id: None,
            category: "Discharge summary".to_string(),
            description: "Report".to_string(),
            content: "Admission Date: ...".to_string(),
            chart_date: None,
            timestamp: Utc::now(),
            title: "Discharge summary - Report".to_string(),
            summary: "Admission Date: ...".to_string(),
        }
    }

    #[test]
    fn test_sink_document_has_mandatory_fields() {
        let doc = note().to_sink_document().unwrap();
        assert_eq!(doc.id, "note_1");
        for field in ["id", "type", "source", "timestamp", "title", "summary"] {
            assert!(doc.body.get(field).is_some(), "missing {field}");
        }
        assert_eq!(doc.body["type"], "clinical-note");
        assert!(doc.body.get("admission_id").is_none());
    }

    #[test]
    fn test_person_name_full() {
        let name = PersonName {
            first: "Ana".to_string(),
            last: "Lopez".to_string(),
            ..Default::default()
        };
        assert_eq!(name.full(), "Ana Lopez");
    }

    #[test]
    fn test_lab_interpretation_names() {
        let json = serde_json::to_string(&LabStatus::CriticalHigh).unwrap();
        assert_eq!(json, "\"critical_high\"");
    }
}
