//! Clinical feature derivation
//!
//! Pure functions from normalized records to derived features. Nothing here
//! performs I/O or keeps state; the keyword tables are passed in so a run can
//! swap them without touching the logic.

pub mod care_gaps;
pub mod category;
pub mod complexity;
pub mod medication;
pub mod observations;
pub mod risk;
pub mod severity;
pub mod utilization;

pub use care_gaps::care_gaps;
pub use category::categorize;
pub use complexity::complexity_score;
pub use medication::{
    extract_frequency, extract_medication_name, extract_route, medication_class,
};
pub use observations::{interpret_lab, split_observations};
pub use risk::{clinical_risk_factors, risk_profile};
pub use severity::classify_severity;
pub use utilization::{
    data_completeness, social_determinants, summarize_encounters, utilization,
};

/// True when the lowercased text contains any of the (lowercase) keywords
pub(crate) fn mentions(text_lower: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && text_lower.contains(k.as_str()))
}
