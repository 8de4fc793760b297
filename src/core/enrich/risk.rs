//! Patient risk scoring

use super::mentions;
use crate::domain::{ConditionRecord, RiskLevel, RiskProfile};
use crate::terminology::ClassificationTables;

const ADVANCED_AGE: u32 = 65;
const MIDDLE_AGE: u32 = 45;

/// Score a patient from age and high-risk conditions
///
/// +2 above 65, +1 above 45, then +1 for every condition whose description
/// mentions a high-risk keyword (the description is recorded as a factor).
/// A score of 4 or more is high, 2 or more medium.
///
/// The score never decreases when a condition is added or the age grows.
pub fn risk_profile(
    conditions: &[ConditionRecord],
    age: u32,
    tables: &ClassificationTables,
) -> RiskProfile {
    let mut risk_score = 0;
    let mut risk_factors = Vec::new();

    if age > ADVANCED_AGE {
        risk_score += 2;
        risk_factors.push("advanced_age".to_string());
    } else if age > MIDDLE_AGE {
        risk_score += 1;
        risk_factors.push("middle_age".to_string());
    }

    for condition in conditions {
        let text = condition.description.to_lowercase();
        if mentions(&text, &tables.high_risk_keywords) {
            risk_score += 1;
            risk_factors.push(condition.description.clone());
        }
    }

    let risk_level = if risk_score >= 4 {
        RiskLevel::High
    } else if risk_score >= 2 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskProfile {
        risk_score,
        risk_level,
        risk_factors,
    }
}

/// Named clinical risk factors present in any condition, in table order
pub fn clinical_risk_factors(
    conditions: &[ConditionRecord],
    tables: &ClassificationTables,
) -> Vec<String> {
    let descriptions: Vec<String> = conditions
        .iter()
        .map(|c| c.description.to_lowercase())
        .collect();

    tables
        .risk_factors
        .iter()
        .filter(|rule| descriptions.iter().any(|d| mentions(d, &rule.keywords)))
        .map(|rule| rule.factor.clone())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{CodingSystem, ConditionCategory, ConditionStatus, Severity};

    pub(crate) fn condition(description: &str) -> ConditionRecord {
        ConditionRecord {
            source_code: "0000".to_string(),
            source_vocabulary: CodingSystem::SnomedCt,
            target_code: "0000".to_string(),
            description: description.to_string(),
            onset_date: None,
            resolution_date: None,
            status: ConditionStatus::Active,
            severity: Severity::Mild,
            category: ConditionCategory::General,
        }
    }

    fn tables() -> ClassificationTables {
        ClassificationTables::default().normalized()
    }

    #[test]
    fn test_young_patient_without_conditions_is_low() {
        let profile = risk_profile(&[], 30, &tables());
        assert_eq!(profile.risk_score, 0);
        assert_eq!(profile.risk_level, RiskLevel::Low);
        assert!(profile.risk_factors.is_empty());
    }

    #[test]
    fn test_age_bands() {
        assert_eq!(risk_profile(&[], 45, &tables()).risk_score, 0);
        assert_eq!(risk_profile(&[], 46, &tables()).risk_score, 1);
        assert_eq!(risk_profile(&[], 65, &tables()).risk_score, 1);
        let elderly = risk_profile(&[], 66, &tables());
        assert_eq!(elderly.risk_score, 2);
        assert_eq!(elderly.risk_level, RiskLevel::Medium);
        assert_eq!(elderly.risk_factors, vec!["advanced_age"]);
    }

    #[test]
    fn test_high_risk_conditions_counted_once_each() {
        let conditions = vec![
            condition("Diabetes with hypertension"),
            condition("Congestive heart failure"),
            condition("Sprain of ankle"),
        ];
        let profile = risk_profile(&conditions, 70, &tables());
        assert_eq!(profile.risk_score, 4);
        assert_eq!(profile.risk_level, RiskLevel::High);
        assert_eq!(
            profile.risk_factors,
            vec![
                "advanced_age",
                "Diabetes with hypertension",
                "Congestive heart failure"
            ]
        );
    }

    #[test]
    fn test_risk_is_monotonic() {
        let base = vec![condition("Essential hypertension")];
        let mut more = base.clone();
        more.push(condition("Cancer of colon"));

        let a = risk_profile(&base, 50, &tables());
        let b = risk_profile(&more, 50, &tables());
        assert!(b.risk_score >= a.risk_score);
        assert!(b.risk_level >= a.risk_level);

        let young = risk_profile(&base, 30, &tables());
        let old = risk_profile(&base, 70, &tables());
        assert!(old.risk_score > young.risk_score);
    }

    #[test]
    fn test_clinical_risk_factors() {
        let conditions = vec![
            condition("End stage renal disease"),
            condition("Type 2 diabetes mellitus without complications"),
            condition("Diabetic nephropathy"),
        ];
        assert_eq!(
            clinical_risk_factors(&conditions, &tables()),
            vec!["diabetes_mellitus", "chronic_kidney_disease"]
        );
        assert!(clinical_risk_factors(&[], &tables()).is_empty());
    }
}
