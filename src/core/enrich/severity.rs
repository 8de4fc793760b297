//! Condition severity

use super::mentions;
use crate::domain::Severity;
use crate::terminology::ClassificationTables;

/// Classify a condition description as mild, moderate or severe
///
/// Matching is a case-insensitive substring search. When several rules match,
/// the most severe one wins, so "chronic severe" is severe regardless of how
/// the rules are ordered.
pub fn classify_severity(description: &str, tables: &ClassificationTables) -> Severity {
    let text = description.to_lowercase();
    tables
        .severity
        .iter()
        .filter(|rule| mentions(&text, &rule.keywords))
        .map(|rule| rule.severity)
        .max()
        .unwrap_or(Severity::Mild)
}
