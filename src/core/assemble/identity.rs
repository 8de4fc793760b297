//! Deterministic document identifiers
//!
//! Anonymized ids are SHA-256 based, so they do not line up with MD5-derived
//! `pat_` ids already present in an index populated by other tooling; reindex
//! rather than mixing the two.

use crate::domain::{Dialect, DocumentId, PatientKey, RecordError};
use sha2::{Digest, Sha256};

const ANONYMIZED_PREFIX: &str = "pat_";

/// `pat_` followed by the first `digest_len` hex characters of
/// SHA-256(`patient_<key>_<salt>`)
pub fn anonymized_id(key: &PatientKey, salt: &str, digest_len: usize) -> String {
    let digest = Sha256::digest(format!("patient_{}_{}", key.as_str(), salt).as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    let len = digest_len.clamp(1, hex.len());
    format!("{ANONYMIZED_PREFIX}{}", &hex[..len])
}

fn plain_prefix(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Mimic => "patient_",
        Dialect::Synthea => "synthea_patient_",
    }
}

/// Id of a patient document; the same key and flag always give the same id
pub fn patient_document_id(
    dialect: Dialect,
    key: &PatientKey,
    anonymize: bool,
    digest_len: usize,
) -> Result<DocumentId, RecordError> {
    let id = if anonymize {
        anonymized_id(key, dialect.as_str(), digest_len)
    } else {
        format!("{}{}", plain_prefix(dialect), key.as_str())
    };
    DocumentId::new(id).map_err(RecordError::MissingField)
}

/// Id of an event document (`lab_<ROW_ID>`, `note_<ROW_ID>`)
pub fn event_document_id(prefix: &str, row_id: &str) -> Result<DocumentId, RecordError> {
    DocumentId::new(format!("{prefix}_{}", row_id.trim())).map_err(RecordError::MissingField)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> PatientKey {
        PatientKey::new(value).unwrap()
    }

    #[test]
    fn test_anonymized_id_is_stable() {
        let first = patient_document_id(Dialect::Mimic, &key("10006"), true, 8).unwrap();
        let second = patient_document_id(Dialect::Mimic, &key("10006"), true, 8).unwrap();
        assert_eq!(first, second);
        assert!(first.as_str().starts_with("pat_"));
        assert_eq!(first.as_str().len(), 4 + 8);
        assert!(first.as_str()[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_anonymized_id_depends_on_salt_and_key() {
        let mimic = patient_document_id(Dialect::Mimic, &key("42"), true, 16).unwrap();
        let synthea = patient_document_id(Dialect::Synthea, &key("42"), true, 16).unwrap();
        let other = patient_document_id(Dialect::Mimic, &key("43"), true, 16).unwrap();
        assert_ne!(mimic, synthea);
        assert_ne!(mimic, other);
    }

    #[test]
    fn test_digest_length_is_configurable() {
        let id = anonymized_id(&key("42"), "mimic", 64);
        assert_eq!(id.len(), 4 + 64);
        let short = anonymized_id(&key("42"), "mimic", 8);
        assert!(id.starts_with(&short));
    }

    #[test]
    fn test_plain_ids() {
        assert_eq!(
            patient_document_id(Dialect::Mimic, &key("10006"), false, 8)
                .unwrap()
                .as_str(),
            "patient_10006"
        );
        assert_eq!(
            patient_document_id(Dialect::Synthea, &key("b3c1"), false, 8)
                .unwrap()
                .as_str(),
            "synthea_patient_b3c1"
        );
    }

    #[test]
    fn test_event_document_id() {
        assert_eq!(event_document_id("lab", " 281 ").unwrap().as_str(), "lab_281");
    }
}
