//! Logical tables and their physical file names per dialect

use crate::domain::Dialect;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalTable {
    Patients,
    Admissions,
    Diagnoses,
    DiagnosisDictionary,
    Prescriptions,
    LabEvents,
    LabItems,
    NoteEvents,
    Encounters,
    Conditions,
    Medications,
    Observations,
}

impl LogicalTable {
    /// File name of this table in the given dialect, if the dialect has it
    pub fn file_name(&self, dialect: Dialect) -> Option<&'static str> {
        match (dialect, self) {
            (Dialect::Mimic, LogicalTable::Patients) => Some("PATIENTS.csv"),
            (Dialect::Mimic, LogicalTable::Admissions) => Some("ADMISSIONS.csv"),
            (Dialect::Mimic, LogicalTable::Diagnoses) => Some("DIAGNOSES_ICD.csv"),
            (Dialect::Mimic, LogicalTable::DiagnosisDictionary) => Some("D_ICD_DIAGNOSES.csv"),
            (Dialect::Mimic, LogicalTable::Prescriptions) => Some("PRESCRIPTIONS.csv"),
            (Dialect::Mimic, LogicalTable::LabEvents) => Some("LABEVENTS.csv"),
            (Dialect::Mimic, LogicalTable::LabItems) => Some("D_LABITEMS.csv"),
            (Dialect::Mimic, LogicalTable::NoteEvents) => Some("NOTEEVENTS.csv"),
            (Dialect::Synthea, LogicalTable::Patients) => Some("patients.csv"),
            (Dialect::Synthea, LogicalTable::Encounters) => Some("encounters.csv"),
            (Dialect::Synthea, LogicalTable::Conditions) => Some("conditions.csv"),
            (Dialect::Synthea, LogicalTable::Medications) => Some("medications.csv"),
            (Dialect::Synthea, LogicalTable::Observations) => Some("observations.csv"),
            _ => None,
        }
    }

    /// Column holding the patient natural key
    pub fn patient_key_column(&self, dialect: Dialect) -> &'static str {
        match (dialect, self) {
            (Dialect::Mimic, _) => "SUBJECT_ID",
            (Dialect::Synthea, LogicalTable::Patients) => "Id",
            (Dialect::Synthea, _) => "PATIENT",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalTable::Patients => "patients",
            LogicalTable::Admissions => "admissions",
            LogicalTable::Diagnoses => "diagnoses",
            LogicalTable::DiagnosisDictionary => "diagnosis_dictionary",
            LogicalTable::Prescriptions => "prescriptions",
            LogicalTable::LabEvents => "lab_events",
            LogicalTable::LabItems => "lab_items",
            LogicalTable::NoteEvents => "note_events",
            LogicalTable::Encounters => "encounters",
            LogicalTable::Conditions => "conditions",
            LogicalTable::Medications => "medications",
            LogicalTable::Observations => "observations",
        }
    }
}

impl fmt::Display for LogicalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(
            LogicalTable::Patients.file_name(Dialect::Mimic),
            Some("PATIENTS.csv")
        );
        assert_eq!(
            LogicalTable::Patients.file_name(Dialect::Synthea),
            Some("patients.csv")
        );
        assert_eq!(LogicalTable::NoteEvents.file_name(Dialect::Synthea), None);
        assert_eq!(LogicalTable::Observations.file_name(Dialect::Mimic), None);
    }

    #[test]
    fn test_patient_key_columns() {
        assert_eq!(
            LogicalTable::Diagnoses.patient_key_column(Dialect::Mimic),
            "SUBJECT_ID"
        );
        assert_eq!(
            LogicalTable::Patients.patient_key_column(Dialect::Synthea),
            "Id"
        );
        assert_eq!(
            LogicalTable::Conditions.patient_key_column(Dialect::Synthea),
            "PATIENT"
        );
    }
}
