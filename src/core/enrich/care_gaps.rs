//! Care gap detection

use crate::domain::{ConditionRecord, MedicationRecord};
use crate::terminology::ClassificationTables;

/// Evaluate every care-gap rule independently
///
/// A rule fires when some condition mentions its keyword and no medication's
/// therapeutic class is one of the rule's treatment classes. Class comparison
/// ignores case. Output follows rule order.
pub fn care_gaps(
    conditions: &[ConditionRecord],
    medications: &[MedicationRecord],
    tables: &ClassificationTables,
) -> Vec<String> {
    let descriptions: Vec<String> = conditions
        .iter()
        .map(|c| c.description.to_lowercase())
        .collect();

    tables
        .care_gaps
        .iter()
        .filter(|rule| {
            let keyword = rule.condition_keyword.as_str();
            let has_condition = descriptions.iter().any(|d| d.contains(keyword));
            let treated = medications.iter().any(|m| {
                rule.treatment_classes
                    .iter()
                    .any(|class| class.eq_ignore_ascii_case(m.therapeutic_class.trim()))
            });
            has_condition && !treated
        })
        .map(|rule| rule.gap_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enrich::risk::tests::condition;
    use crate::domain::MedicationStatus;

    fn medication(name: &str, class: &str) -> MedicationRecord {
        MedicationRecord {
            code: None,
            name: name.to_string(),
            description: name.to_string(),
            start_date: None,
            end_date: None,
            status: MedicationStatus::Active,
            therapeutic_class: class.to_string(),
            route: "oral".to_string(),
            frequency: "as directed".to_string(),
        }
    }

    fn tables() -> ClassificationTables {
        ClassificationTables::default().normalized()
    }

    #[test]
    fn test_diabetes_without_medication() {
        let conditions = vec![condition("Type 2 diabetes mellitus")];
        assert_eq!(
            care_gaps(&conditions, &[], &tables()),
            vec!["diabetes_without_medication"]
        );
    }

    #[test]
    fn test_antidiabetic_closes_gap() {
        let conditions = vec![condition("Type 2 diabetes mellitus")];
        let meds = vec![medication("metformin", "Antidiabetic")];
        assert!(care_gaps(&conditions, &meds, &tables()).is_empty());

        let meds = vec![medication("metformin", "ANTIDIABETIC")];
        assert!(care_gaps(&conditions, &meds, &tables()).is_empty());
    }

    #[test]
    fn test_rules_are_independent() {
        let conditions = vec![
            condition("Type 2 diabetes mellitus"),
            condition("Essential hypertension"),
        ];
        let meds = vec![medication("amlodipine", "Calcium Channel Blocker")];
        assert_eq!(
            care_gaps(&conditions, &meds, &tables()),
            vec!["diabetes_without_medication"]
        );

        let both = care_gaps(&conditions, &[], &tables());
        assert_eq!(
            both,
            vec![
                "diabetes_without_medication",
                "hypertension_without_medication"
            ]
        );
    }

    #[test]
    fn test_unrelated_medication_does_not_close_gap() {
        let conditions = vec![condition("Essential hypertension")];
        let meds = vec![medication("atorvastatin", "Statin")];
        assert_eq!(
            care_gaps(&conditions, &meds, &tables()),
            vec!["hypertension_without_medication"]
        );
    }

    #[test]
    fn test_no_conditions_no_gaps() {
        assert!(care_gaps(&[], &[], &tables()).is_empty());
    }
}
