//! Observation classification and lab interpretation

use crate::domain::{LabInterpretation, LabStatus, ObservationRecord};
use crate::terminology::ClassificationTables;

/// Split coded observations into vital signs and lab results
///
/// Only codes listed in the vital-sign or lab tables are kept; each kept
/// record is renamed to the table's name for its code.
pub fn split_observations(
    observations: Vec<ObservationRecord>,
    tables: &ClassificationTables,
) -> (Vec<ObservationRecord>, Vec<ObservationRecord>) {
    let mut vital_signs = Vec::new();
    let mut lab_results = Vec::new();

    for mut observation in observations {
        let code = observation.code.trim();
        if let Some(name) = tables.vital_sign_codes.get(code) {
            observation.name = name.clone();
            vital_signs.push(observation);
        } else if let Some(name) = tables.lab_codes.get(code) {
            observation.name = name.clone();
            lab_results.push(observation);
        }
    }

    (vital_signs, lab_results)
}

/// Compare a lab value against the reference range for its test
pub fn interpret_lab(
    test_name: &str,
    value: &str,
    tables: &ClassificationTables,
) -> LabInterpretation {
    let Some(range) = tables.reference_range(test_name) else {
        return LabInterpretation {
            status: LabStatus::Unknown,
            interpretation: "Reference range not available".to_string(),
            reference_range: None,
        };
    };

    let Ok(numeric) = value.trim().parse::<f64>() else {
        return LabInterpretation {
            status: LabStatus::Invalid,
            interpretation: "Non-numeric value".to_string(),
            reference_range: None,
        };
    };

    let (mut status, mut interpretation) = if numeric < range.low {
        (LabStatus::Low, format!("{test_name} is below normal range"))
    } else if numeric > range.high {
        (LabStatus::High, format!("{test_name} is above normal range"))
    } else {
        (LabStatus::Normal, format!("{test_name} is within normal range"))
    };

    if range.critical_high.is_some_and(|limit| numeric > limit) {
        status = LabStatus::CriticalHigh;
        interpretation = format!("CRITICAL: {test_name} is critically elevated");
    } else if range.critical_low.is_some_and(|limit| numeric < limit) {
        status = LabStatus::CriticalLow;
        interpretation = format!("CRITICAL: {test_name} is critically low");
    }

    LabInterpretation {
        status,
        interpretation,
        reference_range: Some(format!("{}-{} {}", range.low, range.high, range.unit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn tables() -> ClassificationTables {
        ClassificationTables::default().normalized()
    }

    fn observation(code: &str, value: &str) -> ObservationRecord {
        ObservationRecord {
            code: code.to_string(),
            name: String::new(),
            value: value.to_string(),
            value_num: value.parse().ok(),
            unit: None,
            date: None,
        }
    }

    #[test]
    fn test_split_observations() {
        let observations = vec![
            observation("8480-6", "128"),
            observation("2339-0", "101"),
            observation("72166-2", "Never smoker"),
            observation("39156-5", "27.3"),
        ];
        let (vitals, labs) = split_observations(observations, &tables());
        assert_eq!(vitals.len(), 2);
        assert_eq!(vitals[0].name, "systolic_bp");
        assert_eq!(vitals[1].name, "bmi");
        assert_eq!(labs.len(), 1);
        assert_eq!(labs[0].name, "glucose");
    }

    #[test_case("GLUCOSE", "85", LabStatus::Normal)]
    #[test_case("Glucose", "60", LabStatus::Low)]
    #[test_case("GLUCOSE", "150", LabStatus::High)]
    #[test_case("GLUCOSE", "450", LabStatus::CriticalHigh)]
    #[test_case("CREATININE", "5.5", LabStatus::CriticalHigh)]
    #[test_case("HEMOGLOBIN", "6.2", LabStatus::CriticalLow)]
    #[test_case("HEMOGLOBIN", "10.0", LabStatus::Low)]
    #[test_case("POTASSIUM", "4.0", LabStatus::Unknown)]
    #[test_case("GLUCOSE", "see note", LabStatus::Invalid)]
    fn test_interpret_lab(test: &str, value: &str, expected: LabStatus) {
        assert_eq!(interpret_lab(test, value, &tables()).status, expected);
    }

    #[test]
    fn test_interpretation_text_and_range() {
        let result = interpret_lab("CREATININE", "1.0", &tables());
        assert_eq!(result.interpretation, "CREATININE is within normal range");
        assert_eq!(result.reference_range.as_deref(), Some("0.7-1.3 mg/dL"));
    }
}
