//! MIMIC-III document assembly
//!
//! Patients come from `PATIENTS` joined with `ADMISSIONS`, `DIAGNOSES_ICD`
//! and `PRESCRIPTIONS`. Lab events and clinical notes are assembled one row
//! at a time into their own documents.

use super::identity::{event_document_id, patient_document_id};
use super::narrative;
use super::{validated_age, AssembleOutcome, AssemblyContext, SkipReason};
use crate::core::enrich;
use crate::core::source::LookupTable;
use crate::domain::{
    ClinicalNoteDocument, CodingSystem, ConditionRecord, ConditionStatus, Demographics, Dialect,
    DocumentType, EncounterClass, EncounterRecord, LabEventDocument, MedicationRecord,
    MedicationStatus, PatientDocument, PatientKey, RawRow, RecordError,
};
use crate::terminology::crosswalk::dotted_icd9;
use crate::terminology::Terminology;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

/// Child rows joined to one `PATIENTS` row
#[derive(Debug, Clone, Copy, Default)]
pub struct MimicChildren<'a> {
    pub admissions: &'a [RawRow],
    pub diagnoses: &'a [RawRow],
    pub prescriptions: &'a [RawRow],
}

/// Assembles MIMIC-III patient, lab-result and clinical-note documents
pub struct MimicAssembler {
    terminology: Arc<Terminology>,
    context: AssemblyContext,
    /// `D_ICD_DIAGNOSES`: ICD9_CODE to LONG_TITLE
    diagnosis_titles: LookupTable,
    /// `D_LABITEMS`: ITEMID to LABEL
    lab_items: LookupTable,
}

impl MimicAssembler {
    pub fn new(terminology: Arc<Terminology>, context: AssemblyContext) -> Self {
        Self {
            terminology,
            context,
            diagnosis_titles: LookupTable::default(),
            lab_items: LookupTable::default(),
        }
    }

    pub fn with_diagnosis_titles(mut self, titles: LookupTable) -> Self {
        self.diagnosis_titles = titles;
        self
    }

    pub fn with_lab_items(mut self, items: LookupTable) -> Self {
        self.lab_items = items;
        self
    }

    pub fn context(&self) -> &AssemblyContext {
        &self.context
    }

    fn patient_key(row: &RawRow) -> Result<PatientKey, RecordError> {
        row.get("SUBJECT_ID")
            .and_then(|v| PatientKey::new(v).ok())
            .ok_or_else(|| RecordError::MissingField("SUBJECT_ID".to_string()))
    }

    fn patient_id(&self, key: &PatientKey) -> Result<crate::domain::DocumentId, RecordError> {
        patient_document_id(
            Dialect::Mimic,
            key,
            self.context.anonymize,
            self.context.id_digest_len,
        )
    }

    pub fn assemble_patient(
        &self,
        row: &RawRow,
        children: MimicChildren<'_>,
    ) -> AssembleOutcome<PatientDocument> {
        match self.build_patient(row, children) {
            Ok(doc) => AssembleOutcome::Assembled(doc),
            Err(e) => AssembleOutcome::Skipped(e.into()),
        }
    }

    fn build_patient(
        &self,
        row: &RawRow,
        children: MimicChildren<'_>,
    ) -> Result<PatientDocument, RecordError> {
        let tables = &self.terminology.tables;
        let key = Self::patient_key(row)?;
        let birth_date = row.get_date("DOB");
        let death_date = row.get_date("DOD");
        let age = validated_age(
            key.as_str(),
            birth_date,
            death_date,
            self.context.reference_date,
        )?;
        let id = self.patient_id(&key)?;
        let gender = row.get_or("GENDER", "Unknown").to_string();

        let admit_dates: HashMap<&str, NaiveDate> = children
            .admissions
            .iter()
            .filter_map(|a| Some((a.get("HADM_ID")?, a.get_date("ADMITTIME")?)))
            .collect();

        let conditions: Vec<ConditionRecord> = children
            .diagnoses
            .iter()
            .filter_map(|d| self.condition(d, &admit_dates))
            .collect();
        let medications: Vec<MedicationRecord> = children
            .prescriptions
            .iter()
            .map(|p| self.prescription(p))
            .collect();
        let encounters: Vec<EncounterRecord> =
            children.admissions.iter().map(admission_encounter).collect();

        let mut demographics = Demographics::new(age, gender.clone());
        demographics.deceased = death_date.is_some();
        demographics.ethnicity = children
            .admissions
            .first()
            .and_then(|a| a.get("ETHNICITY"))
            .map(str::to_string);
        if !self.context.anonymize {
            demographics.birth_date = birth_date;
            demographics.death_date = death_date;
        }

        let title = narrative::mimic_title(id.as_str(), age, &gender);
        let summary = narrative::mimic_summary(age, &gender, &conditions);

        Ok(PatientDocument {
            source_key: (!self.context.anonymize).then(|| key.as_str().to_string()),
            id,
            doc_type: DocumentType::Patient,
            source: Dialect::Mimic.source_label().to_string(),
            demographics,
            encounters_summary: enrich::summarize_encounters(&encounters),
            utilization: enrich::utilization(&encounters),
            risk_profile: enrich::risk_profile(&conditions, age, tables),
            clinical_risk_factors: enrich::clinical_risk_factors(&conditions, tables),
            complexity_score: enrich::complexity_score(&conditions, children.admissions.len()),
            care_gaps: enrich::care_gaps(&conditions, &medications, tables),
            conditions,
            medications,
            vital_signs: Vec::new(),
            lab_results: Vec::new(),
            social_determinants: None,
            data_completeness: None,
            timestamp: self.context.timestamp,
            title,
            summary,
        })
    }

    fn diagnosis_description(&self, code: &str) -> String {
        let descriptions = &self.terminology.tables.icd9_descriptions;
        self.diagnosis_titles
            .get(code)
            .map(str::to_string)
            .or_else(|| descriptions.get(code).cloned())
            .or_else(|| dotted_icd9(code).and_then(|d| descriptions.get(&d).cloned()))
            .unwrap_or_else(|| format!("Medical condition (ICD: {code})"))
    }

    fn condition(
        &self,
        row: &RawRow,
        admit_dates: &HashMap<&str, NaiveDate>,
    ) -> Option<ConditionRecord> {
        let code = row.get("ICD9_CODE")?;
        let tables = &self.terminology.tables;
        let description = self.diagnosis_description(code);

        Some(ConditionRecord {
            source_code: code.to_string(),
            source_vocabulary: CodingSystem::Icd9Cm,
            target_code: self.terminology.crosswalk.resolve(code, CodingSystem::Icd9Cm),
            onset_date: row
                .get("HADM_ID")
                .and_then(|hadm| admit_dates.get(hadm).copied()),
            resolution_date: None,
            status: ConditionStatus::Active,
            severity: enrich::classify_severity(&description, tables),
            category: enrich::categorize(&description, tables),
            description,
        })
    }

    fn prescription(&self, row: &RawRow) -> MedicationRecord {
        let drug = row.get_or("DRUG", "");
        let name = if drug.is_empty() {
            enrich::extract_medication_name(drug)
        } else {
            drug.to_string()
        };
        let end_date = row.get_date("ENDDATE");

        MedicationRecord {
            code: row.get("NDC").map(str::to_string),
            therapeutic_class: enrich::medication_class(&name, &self.terminology.tables),
            name,
            description: drug.to_string(),
            start_date: row.get_date("STARTDATE"),
            end_date,
            status: if end_date.is_some() {
                MedicationStatus::Discontinued
            } else {
                MedicationStatus::Active
            },
            route: row
                .get("ROUTE")
                .map(str::to_lowercase)
                .unwrap_or_else(|| enrich::extract_route(drug)),
            frequency: enrich::extract_frequency(drug),
        }
    }

    /// One `LABEVENTS` row; rows without a value are filtered
    pub fn assemble_lab_event(&self, row: &RawRow) -> AssembleOutcome<LabEventDocument> {
        let Some(value) = row.get("VALUE") else {
            return AssembleOutcome::Skipped(SkipReason::Filtered("lab value missing"));
        };
        match self.build_lab_event(row, value) {
            Ok(doc) => AssembleOutcome::Assembled(doc),
            Err(e) => AssembleOutcome::Skipped(e.into()),
        }
    }

    fn build_lab_event(&self, row: &RawRow, value: &str) -> Result<LabEventDocument, RecordError> {
        let row_id = row
            .get("ROW_ID")
            .ok_or_else(|| RecordError::MissingField("ROW_ID".to_string()))?;
        let item_id = row
            .get("ITEMID")
            .ok_or_else(|| RecordError::MissingField("ITEMID".to_string()))?;
        let key = Self::patient_key(row)?;

        let test_name = self
            .lab_items
            .get(item_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Lab Item {item_id}"));
        let unit = row.get("VALUEUOM").map(str::to_string);

        Ok(LabEventDocument {
            id: event_document_id("lab", row_id)?,
            doc_type: DocumentType::LabResult,
            source: Dialect::Mimic.source_label().to_string(),
            patient_id: self.patient_id(&key)?,
            admission_id: row.get("HADM_ID").map(str::to_string),
            item_id: item_id.to_string(),
            interpretation: enrich::interpret_lab(&test_name, value, &self.terminology.tables),
            title: narrative::lab_title(&test_name, value),
            summary: narrative::lab_summary(&test_name, value, unit.as_deref()),
            value: value.to_string(),
            value_num: row.get_f64("VALUENUM"),
            unit,
            flag: row.get("FLAG").map(str::to_string),
            chart_time: row.get_datetime("CHARTTIME"),
            test_name,
            timestamp: self.context.timestamp,
        })
    }

    /// One `NOTEEVENTS` row; empty notes are filtered
    pub fn assemble_note(&self, row: &RawRow) -> AssembleOutcome<ClinicalNoteDocument> {
        let Some(text) = row.get("TEXT") else {
            return AssembleOutcome::Skipped(SkipReason::Filtered("note text empty"));
        };
        match self.build_note(row, text) {
            Ok(doc) => AssembleOutcome::Assembled(doc),
            Err(e) => AssembleOutcome::Skipped(e.into()),
        }
    }

    fn build_note(&self, row: &RawRow, text: &str) -> Result<ClinicalNoteDocument, RecordError> {
        let row_id = row
            .get("ROW_ID")
            .ok_or_else(|| RecordError::MissingField("ROW_ID".to_string()))?;
        let key = Self::patient_key(row)?;
        let category = row.get_or("CATEGORY", "Unknown").to_string();
        let description = row.get_or("DESCRIPTION", "Unknown").to_string();

        Ok(ClinicalNoteDocument {
            id: event_document_id("note", row_id)?,
            doc_type: DocumentType::ClinicalNote,
            source: Dialect::Mimic.source_label().to_string(),
            patient_id: self.patient_id(&key)?,
            admission_id: row.get("HADM_ID").map(str::to_string),
            title: narrative::note_title(&category, &description),
            summary: narrative::note_summary(text),
            content: narrative::truncate_chars(text, narrative::NOTE_CONTENT_MAX_CHARS)
                .to_string(),
            category,
            description,
            chart_date: row.get_date("CHARTDATE"),
            timestamp: self.context.timestamp,
        })
    }
}

fn admission_encounter(row: &RawRow) -> EncounterRecord {
    let kind = row.get_or("ADMISSION_TYPE", "UNKNOWN");
    EncounterRecord {
        class: EncounterClass::from_mimic(kind),
        kind: kind.to_string(),
        cost: 0.0,
        start: row.get_datetime("ADMITTIME"),
        end: row.get_datetime("DISCHTIME"),
    }
}
