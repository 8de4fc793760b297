//! Medication detail extraction from free-text descriptions

use crate::terminology::ClassificationTables;

const DOSE_MARKERS: [&str; 4] = ["mg", "ml", "tablet", "capsule"];
const UNKNOWN_MEDICATION: &str = "Unknown medication";
const UNKNOWN_CLASS: &str = "Unknown";

/// First word of the description that is not a dose or form token
///
/// `"Metformin 500 MG Oral Tablet"` yields `"Metformin"`.
pub fn extract_medication_name(description: &str) -> String {
    let mut words = description.split_whitespace().peekable();
    let Some(first) = words.peek().copied() else {
        return UNKNOWN_MEDICATION.to_string();
    };
    words
        .find(|word| {
            let lower = word.to_lowercase();
            !DOSE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .unwrap_or(first)
        .to_string()
}

/// Therapeutic class from the medication table, `Unknown` when nothing matches
pub fn medication_class(name: &str, tables: &ClassificationTables) -> String {
    let lower = name.to_lowercase();
    tables
        .medication_classes
        .iter()
        .find(|rule| !rule.keyword.is_empty() && lower.contains(rule.keyword.as_str()))
        .map(|rule| rule.class.clone())
        .unwrap_or_else(|| UNKNOWN_CLASS.to_string())
}

/// Administration route, defaulting to oral
pub fn extract_route(description: &str) -> String {
    let lower = description.to_lowercase();
    let route = if lower.contains("injection") || lower.contains("subcutaneous") {
        "injection"
    } else if lower.contains("tablet") || lower.contains("capsule") {
        "oral"
    } else if lower.contains("topical") || lower.contains("cream") {
        "topical"
    } else {
        "oral"
    };
    route.to_string()
}

/// Dosing frequency phrase
pub fn extract_frequency(description: &str) -> String {
    let lower = description.to_lowercase();
    let frequency = if lower.contains("daily") {
        "once daily"
    } else if lower.contains("twice") {
        "twice daily"
    } else {
        "as directed"
    };
    frequency.to_string()
}
