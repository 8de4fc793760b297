//! Patient complexity score

use crate::domain::{ConditionRecord, Severity};

const PER_CONDITION: f64 = 0.5;
const PER_SEVERE_CONDITION: f64 = 2.0;
const PER_ADMISSION: f64 = 0.3;
const MAX_SCORE: f64 = 20.0;

/// `min(0.5 * conditions + 2.0 * severe conditions + 0.3 * admissions, 20.0)`
pub fn complexity_score(conditions: &[ConditionRecord], admission_count: usize) -> f64 {
    let severe = conditions
        .iter()
        .filter(|c| c.severity == Severity::Severe)
        .count();
    let score = conditions.len() as f64 * PER_CONDITION
        + severe as f64 * PER_SEVERE_CONDITION
        + admission_count as f64 * PER_ADMISSION;
    score.min(MAX_SCORE)
}
