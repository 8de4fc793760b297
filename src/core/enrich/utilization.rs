//! Encounter aggregates, utilization, social determinants and completeness

use crate::domain::{
    DataCompleteness, EncounterClass, EncounterRecord, EncounterSummary, RawRow, RiskLevel,
    SocialDeterminants, Utilization,
};
use std::collections::BTreeMap;

/// Counts, costs and length of stay across a patient's encounters
pub fn summarize_encounters(encounters: &[EncounterRecord]) -> EncounterSummary {
    if encounters.is_empty() {
        return EncounterSummary::default();
    }

    let mut encounter_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_cost = 0.0;
    for encounter in encounters {
        *encounter_types.entry(encounter.kind.clone()).or_default() += 1;
        total_cost += encounter.cost;
    }

    let stays: Vec<f64> = encounters
        .iter()
        .filter_map(EncounterRecord::length_of_stay_days)
        .collect();
    let avg_length_of_stay_days = if stays.is_empty() {
        None
    } else {
        Some(stays.iter().sum::<f64>() / stays.len() as f64)
    };

    EncounterSummary {
        total_encounters: encounters.len(),
        encounter_types,
        avg_length_of_stay_days,
        total_healthcare_cost: total_cost,
        avg_cost_per_encounter: total_cost / encounters.len() as f64,
    }
}

/// Weighted visit score: inpatient x3, emergency x2, ambulatory x1
pub fn utilization(encounters: &[EncounterRecord]) -> Utilization {
    let count = |class: EncounterClass| {
        encounters.iter().filter(|e| e.class == class).count() as u32
    };
    let inpatient_visits = count(EncounterClass::Inpatient);
    let emergency_visits = count(EncounterClass::Emergency);
    let outpatient_visits = count(EncounterClass::Ambulatory);

    let utilization_score = inpatient_visits * 3 + emergency_visits * 2 + outpatient_visits;
    let risk_level = if utilization_score > 10 {
        RiskLevel::High
    } else if utilization_score > 5 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    Utilization {
        utilization_score,
        risk_level,
        inpatient_visits,
        emergency_visits,
        outpatient_visits,
    }
}

/// Income band and insurance status
pub fn social_determinants(income: Option<f64>, coverage: Option<f64>) -> SocialDeterminants {
    let income_level = match income {
        Some(v) if v > 75_000.0 => "high",
        Some(v) if v > 40_000.0 => "medium",
        Some(_) => "low",
        None => "unknown",
    };
    let insurance_status = if coverage.is_some_and(|c| c > 0.0) {
        "Insured"
    } else {
        "Uninsured"
    };
    SocialDeterminants {
        income_level: income_level.to_string(),
        insurance_status: insurance_status.to_string(),
    }
}

/// 100 minus 10 for each missing key field, floored at 0
pub fn data_completeness(
    row: &RawRow,
    key_fields: &[&str],
    condition_count: usize,
    medication_count: usize,
) -> DataCompleteness {
    let missing_fields: Vec<String> = key_fields
        .iter()
        .filter(|field| row.get(field).is_none())
        .map(|field| field.to_string())
        .collect();
    let score = 100u32.saturating_sub(missing_fields.len() as u32 * 10);

    DataCompleteness {
        score,
        missing_fields,
        condition_count,
        medication_count,
    }
}
