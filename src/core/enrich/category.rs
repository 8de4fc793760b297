//! Condition categorization

use super::mentions;
use crate::domain::ConditionCategory;
use crate::terminology::ClassificationTables;

/// Assign a clinical category; the first matching rule wins, default `general`
pub fn categorize(description: &str, tables: &ClassificationTables) -> ConditionCategory {
    let text = description.to_lowercase();
    tables
        .categories
        .iter()
        .find(|rule| mentions(&text, &rule.keywords))
        .map(|rule| rule.category)
        .unwrap_or(ConditionCategory::General)
}
