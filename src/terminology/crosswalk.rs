//! Code crosswalk resolution
//!
//! Maps source vocabulary codes (ICD-9-CM, SNOMED CT) onto ICD-10-CM. The
//! tables are deliberately small; any code without a mapping passes through
//! unchanged.

use crate::domain::CodingSystem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Serializable form of the crosswalk, as found in a terminology file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrosswalkTables {
    pub icd9_to_icd10: BTreeMap<String, String>,
    pub snomed_to_icd10: BTreeMap<String, String>,
}

impl Default for CrosswalkTables {
    fn default() -> Self {
        let icd9 = [
            ("250.00", "E11.9"),
            ("401.9", "I10"),
            ("272.4", "E78.5"),
            ("414.01", "I25.10"),
            ("496", "J44.1"),
            ("585.6", "N18.6"),
        ];
        let snomed = [
            ("44054006", "E11.9"),
            ("38341003", "I10"),
            ("55822004", "E78.5"),
            ("233604007", "J18.9"),
            ("195967001", "J44.1"),
            ("49436004", "F41.9"),
            ("35489007", "F33.9"),
        ];
        Self {
            icd9_to_icd10: to_map(&icd9),
            snomed_to_icd10: to_map(&snomed),
        }
    }
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Lookup structure built once per run and shared read-only
#[derive(Debug, Clone)]
pub struct CodeCrosswalk {
    icd9_to_icd10: HashMap<String, String>,
    snomed_to_icd10: HashMap<String, String>,
}

impl CodeCrosswalk {
    pub fn new(tables: CrosswalkTables) -> Self {
        Self {
            icd9_to_icd10: tables.icd9_to_icd10.into_iter().collect(),
            snomed_to_icd10: tables.snomed_to_icd10.into_iter().collect(),
        }
    }

    /// Resolve a source code to ICD-10-CM
    ///
    /// Unmapped and empty codes are returned unchanged (after trimming).
    /// ICD-9 codes are also tried in dotted form, since MIMIC-III stores them
    /// without the decimal point.
    ///
    /// # Example
    ///
    /// ```
    /// use mediquery::domain::CodingSystem;
    /// use mediquery::terminology::CodeCrosswalk;
    ///
    /// let crosswalk = CodeCrosswalk::default();
    /// assert_eq!(crosswalk.resolve("4019", CodingSystem::Icd9Cm), "I10");
    /// assert_eq!(crosswalk.resolve("99999", CodingSystem::Icd9Cm), "99999");
    /// ```
    pub fn resolve(&self, code: &str, system: CodingSystem) -> String {
        let code = code.trim();
        if code.is_empty() {
            return String::new();
        }
        let mapped = match system {
            CodingSystem::Icd9Cm => self
                .icd9_to_icd10
                .get(code)
                .or_else(|| dotted_icd9(code).and_then(|d| self.icd9_to_icd10.get(&d))),
            CodingSystem::SnomedCt => self.snomed_to_icd10.get(code),
            CodingSystem::Icd10Cm => None,
        };
        mapped.cloned().unwrap_or_else(|| code.to_string())
    }

    pub fn len(&self) -> usize {
        self.icd9_to_icd10.len() + self.snomed_to_icd10.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CodeCrosswalk {
    fn default() -> Self {
        Self::new(CrosswalkTables::default())
    }
}

/// Insert the decimal point into an undotted ICD-9-CM code
///
/// Diagnosis codes split after three characters, external-cause (`E`) codes
/// after four. Codes that already contain a dot, or have nothing after the
/// split, yield `None`.
pub fn dotted_icd9(code: &str) -> Option<String> {
    if code.contains('.') || !code.is_ascii() {
        return None;
    }
    let split = if code.starts_with('E') || code.starts_with('e') {
        4
    } else {
        3
    };
    if code.len() <= split {
        return None;
    }
    Some(format!("{}.{}", &code[..split], &code[split..]))
}
