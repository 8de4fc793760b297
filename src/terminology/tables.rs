//! Classification tables
//!
//! Ordered keyword tables used by feature derivation. Order is significant:
//! the first matching rule wins. The built-in defaults can be partially or
//! fully replaced from a TOML file; keywords are matched case-insensitively
//! as substrings of the condition or medication text.

use crate::domain::{ConditionCategory, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityRule {
    pub severity: Severity,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: ConditionCategory,
    pub keywords: Vec<String>,
}

/// Maps condition keywords to a named clinical risk factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorRule {
    pub factor: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationClassRule {
    pub keyword: String,
    pub class: String,
}

/// A gap fires when a condition matches `condition_keyword` and no medication
/// belongs to one of `treatment_classes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareGapRule {
    pub gap_id: String,
    pub condition_keyword: String,
    pub treatment_classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    /// Lab label as found in `D_LABITEMS.LABEL`, compared case-insensitively
    pub test: String,
    pub low: f64,
    pub high: f64,
    pub unit: String,
    #[serde(default)]
    pub critical_low: Option<f64>,
    #[serde(default)]
    pub critical_high: Option<f64>,
}

/// All keyword and code tables used by the deriver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationTables {
    pub severity: Vec<SeverityRule>,
    pub categories: Vec<CategoryRule>,
    pub high_risk_keywords: Vec<String>,
    pub risk_factors: Vec<RiskFactorRule>,
    pub medication_classes: Vec<MedicationClassRule>,
    pub care_gaps: Vec<CareGapRule>,
    /// LOINC code to vital sign name
    pub vital_sign_codes: BTreeMap<String, String>,
    /// LOINC code to lab test name
    pub lab_codes: BTreeMap<String, String>,
    pub reference_ranges: Vec<ReferenceRange>,
    /// ICD-9-CM descriptions used when `D_ICD_DIAGNOSES` has no title
    pub icd9_descriptions: BTreeMap<String, String>,
}

impl ClassificationTables {
    /// Validates the tables
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency found
    pub fn validate(&self) -> Result<(), String> {
        for rule in &self.severity {
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(format!(
                    "severity rule '{}' contains an empty keyword",
                    rule.severity
                ));
            }
        }
        for rule in &self.categories {
            if rule.keywords.is_empty() {
                return Err(format!("category rule '{}' has no keywords", rule.category));
            }
        }
        for rule in &self.care_gaps {
            if rule.gap_id.trim().is_empty() || rule.condition_keyword.trim().is_empty() {
                return Err("care gap rules need a gap_id and a condition_keyword".to_string());
            }
            if rule.treatment_classes.is_empty() {
                return Err(format!(
                    "care gap rule '{}' has no treatment classes",
                    rule.gap_id
                ));
            }
        }
        for range in &self.reference_ranges {
            if range.low > range.high {
                return Err(format!(
                    "reference range for '{}' has low > high",
                    range.test
                ));
            }
        }
        Ok(())
    }

    /// Lowercase every keyword so matching only lowercases the input text
    pub fn normalized(mut self) -> Self {
        fn lower(keywords: &mut [String]) {
            for k in keywords.iter_mut() {
                *k = k.trim().to_lowercase();
            }
        }
        for rule in &mut self.severity {
            lower(&mut rule.keywords);
        }
        for rule in &mut self.categories {
            lower(&mut rule.keywords);
        }
        lower(&mut self.high_risk_keywords);
        for rule in &mut self.risk_factors {
            lower(&mut rule.keywords);
        }
        for rule in &mut self.medication_classes {
            rule.keyword = rule.keyword.trim().to_lowercase();
        }
        for rule in &mut self.care_gaps {
            rule.condition_keyword = rule.condition_keyword.trim().to_lowercase();
        }
        self
    }

    /// Reference range for a lab label, if one is known
    pub fn reference_range(&self, test_name: &str) -> Option<&ReferenceRange> {
        self.reference_ranges
            .iter()
            .find(|r| r.test.eq_ignore_ascii_case(test_name.trim()))
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn code_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for ClassificationTables {
    fn default() -> Self {
        let severity = vec![
            SeverityRule {
                severity: Severity::Severe,
                keywords: words(&["severe", "acute", "crisis", "emergency", "end stage"]),
            },
            SeverityRule {
                severity: Severity::Moderate,
                keywords: words(&["chronic", "moderate"]),
            },
        ];

        let categories = vec![
            CategoryRule {
                category: ConditionCategory::Cardiovascular,
                keywords: words(&["hypertension", "heart", "cardiac", "stroke", "coronary"]),
            },
            CategoryRule {
                category: ConditionCategory::Endocrine,
                keywords: words(&["diabetes", "thyroid", "obesity", "metabolic"]),
            },
            CategoryRule {
                category: ConditionCategory::Respiratory,
                keywords: words(&[
                    "asthma",
                    "copd",
                    "pneumonia",
                    "bronchitis",
                    "lung",
                    "pulmonary",
                ]),
            },
            CategoryRule {
                category: ConditionCategory::Renal,
                keywords: words(&["kidney", "renal"]),
            },
            CategoryRule {
                category: ConditionCategory::MentalHealth,
                keywords: words(&["depression", "anxiety", "bipolar", "schizophrenia"]),
            },
            CategoryRule {
                category: ConditionCategory::Musculoskeletal,
                keywords: words(&["arthritis", "osteoporosis", "fracture"]),
            },
            CategoryRule {
                category: ConditionCategory::Infectious,
                keywords: words(&["infection", "sepsis", "influenza"]),
            },
        ];

        let risk_factors = vec![
            RiskFactorRule {
                factor: "diabetes_mellitus".to_string(),
                keywords: words(&["diabetes"]),
            },
            RiskFactorRule {
                factor: "hypertension".to_string(),
                keywords: words(&["hypertension"]),
            },
            RiskFactorRule {
                factor: "chronic_kidney_disease".to_string(),
                keywords: words(&["renal", "kidney"]),
            },
        ];

        let medication_classes = [
            ("metformin", "Antidiabetic"),
            ("insulin", "Antidiabetic"),
            ("glipizide", "Antidiabetic"),
            ("lisinopril", "ACE Inhibitor"),
            ("amlodipine", "Calcium Channel Blocker"),
            ("metoprolol", "Beta Blocker"),
            ("atenolol", "Beta Blocker"),
            ("atorvastatin", "Statin"),
            ("simvastatin", "Statin"),
            ("aspirin", "Antiplatelet"),
            ("ibuprofen", "NSAID"),
        ]
        .iter()
        .map(|(keyword, class)| MedicationClassRule {
            keyword: keyword.to_string(),
            class: class.to_string(),
        })
        .collect();

        let care_gaps = vec![
            CareGapRule {
                gap_id: "diabetes_without_medication".to_string(),
                condition_keyword: "diabetes".to_string(),
                treatment_classes: words(&["Antidiabetic"]),
            },
            CareGapRule {
                gap_id: "hypertension_without_medication".to_string(),
                condition_keyword: "hypertension".to_string(),
                treatment_classes: words(&[
                    "ACE Inhibitor",
                    "Calcium Channel Blocker",
                    "Beta Blocker",
                ]),
            },
        ];

        let reference_ranges = vec![
            ReferenceRange {
                test: "GLUCOSE".to_string(),
                low: 70.0,
                high: 99.0,
                unit: "mg/dL".to_string(),
                critical_low: None,
                critical_high: Some(400.0),
            },
            ReferenceRange {
                test: "CREATININE".to_string(),
                low: 0.7,
                high: 1.3,
                unit: "mg/dL".to_string(),
                critical_low: None,
                critical_high: Some(5.0),
            },
            ReferenceRange {
                test: "HEMOGLOBIN".to_string(),
                low: 12.0,
                high: 15.5,
                unit: "g/dL".to_string(),
                critical_low: Some(7.0),
                critical_high: None,
            },
        ];

        Self {
            severity,
            categories,
            high_risk_keywords: words(&["diabetes", "hypertension", "heart", "stroke", "cancer"]),
            risk_factors,
            medication_classes,
            care_gaps,
            vital_sign_codes: code_map(&[
                ("8462-4", "diastolic_bp"),
                ("8480-6", "systolic_bp"),
                ("8867-4", "heart_rate"),
                ("8310-5", "body_temperature"),
                ("8302-2", "height"),
                ("29463-7", "weight"),
                ("39156-5", "bmi"),
            ]),
            lab_codes: code_map(&[
                ("33747-0", "hemoglobin_a1c"),
                ("2339-0", "glucose"),
                ("2093-3", "cholesterol_total"),
                ("18262-6", "cholesterol_ldl"),
                ("2085-9", "cholesterol_hdl"),
            ]),
            reference_ranges,
            icd9_descriptions: code_map(&[
                ("250.00", "Type 2 diabetes mellitus without complications"),
                ("401.9", "Essential hypertension"),
                ("272.4", "Hyperlipidemia, unspecified"),
                ("414.01", "Coronary atherosclerosis"),
                ("496", "Chronic obstructive pulmonary disease"),
                ("585.6", "End stage renal disease"),
            ]),
        }
    }
}
