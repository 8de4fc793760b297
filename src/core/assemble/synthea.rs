//! Synthea document assembly
//!
//! One patient document per `patients.csv` row, joined with encounters,
//! conditions, medications and observations keyed by `PATIENT`.

use super::identity::patient_document_id;
use super::narrative;
use super::{validated_age, AssembleOutcome, AssemblyContext};
use crate::core::enrich;
use crate::domain::document::{Financial, Identifiers, Location, PersonName};
use crate::domain::{
    CodingSystem, ConditionRecord, ConditionStatus, Demographics, Dialect, DocumentType,
    EncounterClass, EncounterRecord, MedicationRecord, MedicationStatus, ObservationRecord,
    PatientDocument, PatientKey, RawRow, RecordError,
};
use crate::terminology::Terminology;
use std::sync::Arc;

/// Fields whose absence lowers the data-completeness score
pub const COMPLETENESS_FIELDS: [&str; 6] = ["BIRTHDATE", "GENDER", "RACE", "ETHNICITY", "FIRST", "LAST"];

/// Child rows joined to one `patients.csv` row
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheaChildren<'a> {
    pub encounters: &'a [RawRow],
    pub conditions: &'a [RawRow],
    pub medications: &'a [RawRow],
    pub observations: &'a [RawRow],
}

pub struct SyntheaAssembler {
    terminology: Arc<Terminology>,
    context: AssemblyContext,
}

impl SyntheaAssembler {
    pub fn new(terminology: Arc<Terminology>, context: AssemblyContext) -> Self {
        Self {
            terminology,
            context,
        }
    }

    pub fn context(&self) -> &AssemblyContext {
        &self.context
    }

    pub fn assemble_patient(
        &self,
        row: &RawRow,
        children: SyntheaChildren<'_>,
    ) -> AssembleOutcome<PatientDocument> {
        match self.build_patient(row, children) {
            Ok(doc) => AssembleOutcome::Assembled(doc),
            Err(e) => AssembleOutcome::Skipped(e.into()),
        }
    }

    fn build_patient(
        &self,
        row: &RawRow,
        children: SyntheaChildren<'_>,
    ) -> Result<PatientDocument, RecordError> {
        let tables = &self.terminology.tables;
        let key = row
            .get("Id")
            .and_then(|v| PatientKey::new(v).ok())
            .ok_or_else(|| RecordError::MissingField("Id".to_string()))?;
        let birth_date = row.get_date("BIRTHDATE");
        let death_date = row.get_date("DEATHDATE");
        let age = validated_age(
            key.as_str(),
            birth_date,
            death_date,
            self.context.reference_date,
        )?;
        let id = patient_document_id(
            Dialect::Synthea,
            &key,
            self.context.anonymize,
            self.context.id_digest_len,
        )?;

        let conditions: Vec<ConditionRecord> = children
            .conditions
            .iter()
            .map(|c| self.condition(c))
            .collect();
        let medications: Vec<MedicationRecord> = children
            .medications
            .iter()
            .map(|m| self.medication(m))
            .collect();
        let encounters: Vec<EncounterRecord> = children.encounters.iter().map(encounter).collect();
        let observations: Vec<ObservationRecord> =
            children.observations.iter().filter_map(observation).collect();
        let (vital_signs, lab_results) = enrich::split_observations(observations, tables);

        let first = row.get_or("FIRST", "");
        let last = row.get_or("LAST", "");
        let gender = row.get_or("GENDER", "Unknown").to_string();
        let full_name = format!("{first} {last}");

        let demographics = self.demographics(row, age, &gender, birth_date, death_date);
        let income = row.get_f64("INCOME");
        let coverage = row.get_f64("HEALTHCARE_COVERAGE");
        let utilization = enrich::utilization(&encounters);
        let complexity_score =
            enrich::complexity_score(&conditions, utilization.inpatient_visits as usize);

        Ok(PatientDocument {
            source_key: (!self.context.anonymize).then(|| key.as_str().to_string()),
            id,
            doc_type: DocumentType::Patient,
            source: Dialect::Synthea.source_label().to_string(),
            title: narrative::synthea_title(first, last, age, &gender),
            summary: narrative::synthea_summary(&full_name, age, &gender, &conditions),
            demographics,
            encounters_summary: enrich::summarize_encounters(&encounters),
            utilization,
            risk_profile: enrich::risk_profile(&conditions, age, tables),
            clinical_risk_factors: enrich::clinical_risk_factors(&conditions, tables),
            complexity_score,
            care_gaps: enrich::care_gaps(&conditions, &medications, tables),
            social_determinants: Some(enrich::social_determinants(income, coverage)),
            data_completeness: Some(enrich::data_completeness(
                row,
                &COMPLETENESS_FIELDS,
                conditions.len(),
                medications.len(),
            )),
            conditions,
            medications,
            vital_signs,
            lab_results,
            timestamp: self.context.timestamp,
        })
    }

    fn demographics(
        &self,
        row: &RawRow,
        age: u32,
        gender: &str,
        birth_date: Option<chrono::NaiveDate>,
        death_date: Option<chrono::NaiveDate>,
    ) -> Demographics {
        let text = |column: &str| row.get(column).map(str::to_string);

        let mut demographics = Demographics::new(age, gender);
        demographics.deceased = death_date.is_some();
        demographics.death_date = death_date;
        demographics.race = text("RACE");
        demographics.ethnicity = text("ETHNICITY");
        demographics.marital_status = text("MARITAL");
        demographics.name = Some(PersonName {
            prefix: text("PREFIX"),
            first: row.get_or("FIRST", "").to_string(),
            last: row.get_or("LAST", "").to_string(),
            suffix: text("SUFFIX"),
            maiden: text("MAIDEN"),
        });
        demographics.location = Some(Location {
            birthplace: text("BIRTHPLACE"),
            address: text("ADDRESS"),
            city: text("CITY"),
            state: text("STATE"),
            county: text("COUNTY"),
            zip: text("ZIP"),
        });
        demographics.financial = Some(Financial {
            healthcare_expenses: row.get_f64("HEALTHCARE_EXPENSES"),
            healthcare_coverage: row.get_f64("HEALTHCARE_COVERAGE"),
            income: row.get_f64("INCOME"),
        });
        if !self.context.anonymize {
            demographics.birth_date = birth_date;
            demographics.identifiers = Some(Identifiers {
                ssn: text("SSN"),
                drivers_license: text("DRIVERS"),
                passport: text("PASSPORT"),
            });
        }
        demographics
    }

    fn condition(&self, row: &RawRow) -> ConditionRecord {
        let tables = &self.terminology.tables;
        let code = row.get_or("CODE", "");
        let description = row.get_or("DESCRIPTION", "").to_string();
        let resolution_date = row.get_date("STOP");

        ConditionRecord {
            source_code: code.to_string(),
            source_vocabulary: CodingSystem::SnomedCt,
            target_code: self.terminology.crosswalk.resolve(code, CodingSystem::SnomedCt),
            onset_date: row.get_date("START"),
            resolution_date,
            status: if resolution_date.is_some() {
                ConditionStatus::Resolved
            } else {
                ConditionStatus::Active
            },
            severity: enrich::classify_severity(&description, tables),
            category: enrich::categorize(&description, tables),
            description,
        }
    }

    fn medication(&self, row: &RawRow) -> MedicationRecord {
        let description = row.get_or("DESCRIPTION", "");
        let name = enrich::extract_medication_name(description);
        let end_date = row.get_date("STOP");

        MedicationRecord {
            code: row.get("CODE").map(str::to_string),
            therapeutic_class: enrich::medication_class(&name, &self.terminology.tables),
            name,
            description: description.to_string(),
            start_date: row.get_date("START"),
            end_date,
            status: if end_date.is_some() {
                MedicationStatus::Discontinued
            } else {
                MedicationStatus::Active
            },
            route: enrich::extract_route(description),
            frequency: enrich::extract_frequency(description),
        }
    }
}

fn encounter(row: &RawRow) -> EncounterRecord {
    let kind = row.get_or("ENCOUNTERCLASS", "unknown");
    EncounterRecord {
        class: EncounterClass::from_synthea(kind),
        kind: kind.to_string(),
        cost: row.get_f64("TOTAL_CLAIM_COST").unwrap_or(0.0),
        start: row.get_datetime("START"),
        end: row.get_datetime("STOP"),
    }
}

fn observation(row: &RawRow) -> Option<ObservationRecord> {
    Some(ObservationRecord {
        code: row.get("CODE")?.to_string(),
        name: row.get_or("DESCRIPTION", "").to_string(),
        value: row.get_or("VALUE", "").to_string(),
        value_num: row.get_f64("VALUE"),
        unit: row.get("UNITS").map(str::to_string),
        date: row.get_date("DATE"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn assembler(anonymize: bool) -> SyntheaAssembler {
        let context = AssemblyContext::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            anonymize,
            8,
        );
        SyntheaAssembler::new(Arc::new(Terminology::builtin()), context)
    }

    fn patient_row() -> RawRow {
        RawRow::from_pairs(&[
            ("Id", "b3c1-77"),
            ("BIRTHDATE", "1970-05-20"),
            ("DEATHDATE", ""),
            ("SSN", "999-12-3456"),
            ("DRIVERS", "S99912345"),
            ("PASSPORT", ""),
            ("FIRST", "Ana"),
            ("LAST", "Diaz"),
            ("MARITAL", "M"),
            ("RACE", "white"),
            ("ETHNICITY", ""),
            ("GENDER", "F"),
            ("CITY", "Boston"),
            ("HEALTHCARE_EXPENSES", "12000.5"),
            ("HEALTHCARE_COVERAGE", "800"),
            ("INCOME", "52000"),
        ])
    }

    fn condition_row(code: &str, description: &str, stop: &str) -> RawRow {
        RawRow::from_pairs(&[
            ("START", "2015-01-01"),
            ("STOP", stop),
            ("PATIENT", "b3c1-77"),
            ("CODE", code),
            ("DESCRIPTION", description),
        ])
    }

    #[test]
    fn test_assemble_patient() {
        let conditions = vec![
            condition_row("44054006", "Diabetes mellitus type 2", ""),
            condition_row("38341003", "Hypertension", ""),
            condition_row("444814009", "Viral sinusitis", "2016-02-01"),
        ];
        let medications = vec![RawRow::from_pairs(&[
            ("START", "2015-02-01"),
            ("STOP", ""),
            ("PATIENT", "b3c1-77"),
            ("CODE", "314076"),
            ("DESCRIPTION", "lisinopril 10 MG Oral Tablet"),
        ])];
        let encounters = vec![
            RawRow::from_pairs(&[
                ("Id", "e1"),
                ("START", "2020-01-01T08:00:00Z"),
                ("STOP", "2020-01-03T08:00:00Z"),
                ("PATIENT", "b3c1-77"),
                ("ENCOUNTERCLASS", "inpatient"),
                ("TOTAL_CLAIM_COST", "900"),
            ]),
            RawRow::from_pairs(&[
                ("Id", "e2"),
                ("START", "2021-01-01T08:00:00Z"),
                ("STOP", "2021-01-01T09:00:00Z"),
                ("PATIENT", "b3c1-77"),
                ("ENCOUNTERCLASS", "wellness"),
                ("TOTAL_CLAIM_COST", "100"),
            ]),
        ];
        let observations = vec![
            RawRow::from_pairs(&[
                ("DATE", "2021-01-01T08:30:00Z"),
                ("PATIENT", "b3c1-77"),
                ("CODE", "8480-6"),
                ("DESCRIPTION", "Systolic Blood Pressure"),
                ("VALUE", "142"),
                ("UNITS", "mm[Hg]"),
            ]),
            RawRow::from_pairs(&[
                ("DATE", "2021-01-01T08:30:00Z"),
                ("PATIENT", "b3c1-77"),
                ("CODE", "2339-0"),
                ("DESCRIPTION", "Glucose"),
                ("VALUE", "131"),
                ("UNITS", "mg/dL"),
            ]),
        ];
        let children = SyntheaChildren {
            encounters: &encounters,
            conditions: &conditions,
            medications: &medications,
            observations: &observations,
        };

        let doc = assembler(false)
            .assemble_patient(&patient_row(), children)
            .assembled()
            .unwrap();

        assert_eq!(doc.id.as_str(), "synthea_patient_b3c1-77");
        assert_eq!(doc.source, "Synthea");
        assert_eq!(doc.demographics.age, 53);
        assert_eq!(doc.title, "Patient Ana Diaz - 53yr F");
        assert_eq!(
            doc.summary,
            "Ana Diaz - 53-year-old f with Diabetes mellitus type 2, Hypertension"
        );

        assert_eq!(doc.conditions[0].target_code, "E11.9");
        assert_eq!(doc.conditions[2].status, ConditionStatus::Resolved);
        assert_eq!(doc.medications[0].name, "lisinopril");
        assert_eq!(doc.medications[0].therapeutic_class, "ACE Inhibitor");
        assert_eq!(doc.medications[0].route, "oral");
        assert_eq!(doc.care_gaps, vec!["diabetes_without_medication"]);

        assert_eq!(doc.vital_signs.len(), 1);
        assert_eq!(doc.vital_signs[0].name, "systolic_bp");
        assert_eq!(doc.lab_results.len(), 1);
        assert_eq!(doc.lab_results[0].value_num, Some(131.0));

        assert_eq!(doc.encounters_summary.total_encounters, 2);
        assert_eq!(doc.encounters_summary.total_healthcare_cost, 1000.0);
        assert_eq!(doc.encounters_summary.avg_length_of_stay_days.map(|d| d > 1.0), Some(true));
        // inpatient scores 3, wellness is unscored
        assert_eq!(doc.utilization.utilization_score, 3);
        assert_eq!(doc.utilization.inpatient_visits, 1);

        let social = doc.social_determinants.as_ref().unwrap();
        assert_eq!(social.income_level, "medium");
        assert_eq!(social.insurance_status, "Insured");

        let completeness = doc.data_completeness.as_ref().unwrap();
        assert_eq!(completeness.score, 90);
        assert_eq!(completeness.missing_fields, vec!["ETHNICITY"]);

        let identifiers = doc.demographics.identifiers.as_ref().unwrap();
        assert_eq!(identifiers.ssn.as_deref(), Some("999-12-3456"));
        assert!(identifiers.passport.is_none());
    }

    #[test]
    fn test_inpatient_encounters_count_as_admissions() {
        let encounters: Vec<RawRow> = (0..5)
            .map(|i| {
                let id = format!("e{i}");
                RawRow::from_pairs(&[
                    ("Id", id.as_str()),
                    ("START", "2020-01-01T08:00:00Z"),
                    ("STOP", "2020-01-02T08:00:00Z"),
                    ("PATIENT", "b3c1-77"),
                    ("ENCOUNTERCLASS", "inpatient"),
                ])
            })
            .collect();
        let children = SyntheaChildren {
            encounters: &encounters,
            ..SyntheaChildren::default()
        };

        let doc = assembler(false)
            .assemble_patient(&patient_row(), children)
            .assembled()
            .unwrap();

        assert_eq!(doc.utilization.inpatient_visits, 5);
        assert!((doc.complexity_score - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_anonymized_patient_drops_identity_documents() {
        let doc = assembler(true)
            .assemble_patient(&patient_row(), SyntheaChildren::default())
            .assembled()
            .unwrap();
        assert!(doc.id.as_str().starts_with("pat_"));
        assert!(doc.demographics.identifiers.is_none());
        assert!(doc.demographics.birth_date.is_none());
        assert_eq!(doc.demographics.name.as_ref().unwrap().first, "Ana");
        assert_eq!(
            doc.summary,
            "Ana Diaz - 53-year-old f patient with no recorded conditions"
        );
    }

    #[test]
    fn test_missing_birthdate_is_skipped() {
        let row = RawRow::from_pairs(&[("Id", "x"), ("BIRTHDATE", "not a date")]);
        match assembler(false).assemble_patient(&row, SyntheaChildren::default()) {
            AssembleOutcome::Skipped(reason) => assert!(reason.is_error()),
            AssembleOutcome::Assembled(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn test_missing_id_is_skipped() {
        let row = RawRow::from_pairs(&[("Id", ""), ("BIRTHDATE", "1990-01-01")]);
        assert!(!assembler(false)
            .assemble_patient(&row, SyntheaChildren::default())
            .is_assembled());
    }
}
