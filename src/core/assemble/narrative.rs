//! Titles and summaries shown in search results

use crate::domain::ConditionRecord;

/// Longest note content kept in a document, in characters
pub const NOTE_CONTENT_MAX_CHARS: usize = 5000;

/// Longest note summary before the ellipsis, in characters
pub const NOTE_SUMMARY_MAX_CHARS: usize = 200;

const UNKNOWN_GENDER: &str = "unknown gender";

fn gender_phrase(gender: &str) -> String {
    if gender.trim().is_empty() {
        UNKNOWN_GENDER.to_string()
    } else {
        gender.to_lowercase()
    }
}

fn descriptions<'a>(conditions: impl Iterator<Item = &'a ConditionRecord>) -> String {
    conditions
        .map(|c| c.description.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn mimic_title(patient_id: &str, age: u32, gender: &str) -> String {
    format!("Patient {patient_id} - {age}yr {gender}")
}

/// `<age>-year-old <gender> patient with c1, c2 and N additional condition(s)`
pub fn mimic_summary(age: u32, gender: &str, conditions: &[ConditionRecord]) -> String {
    let mut summary = format!("{age}-year-old {} patient", gender_phrase(gender));
    if conditions.is_empty() {
        return summary;
    }

    summary.push_str(" with ");
    summary.push_str(&descriptions(conditions.iter().take(2)));
    if conditions.len() > 2 {
        summary.push_str(&format!(
            " and {} additional condition(s)",
            conditions.len() - 2
        ));
    }
    summary
}

pub fn synthea_title(first: &str, last: &str, age: u32, gender: &str) -> String {
    format!("Patient {first} {last} - {age}yr {gender}")
}

/// Up to three active conditions, otherwise the history, otherwise none
pub fn synthea_summary(
    name: &str,
    age: u32,
    gender: &str,
    conditions: &[ConditionRecord],
) -> String {
    let gender = gender_phrase(gender);
    if conditions.is_empty() {
        return format!("{name} - {age}-year-old {gender} patient with no recorded conditions");
    }

    let active: Vec<&ConditionRecord> = conditions.iter().filter(|c| c.is_active()).collect();
    if active.is_empty() {
        return format!(
            "{name} - {age}-year-old {gender} with history of {}",
            descriptions(conditions.iter().take(2))
        );
    }

    let mut summary = format!(
        "{name} - {age}-year-old {gender} with {}",
        descriptions(active.iter().copied().take(3))
    );
    if active.len() > 3 {
        summary.push_str(&format!(
            " and {} additional active condition(s)",
            active.len() - 3
        ));
    }
    summary
}

pub fn lab_title(test_name: &str, value: &str) -> String {
    format!("{test_name} - {value}")
}

pub fn lab_summary(test_name: &str, value: &str, unit: Option<&str>) -> String {
    format!("Lab result: {test_name} = {value} {}", unit.unwrap_or(""))
        .trim_end()
        .to_string()
}

pub fn note_title(category: &str, description: &str) -> String {
    format!("{category} - {description}")
}

/// First 200 characters of the note, with `...` when cut
pub fn note_summary(content: &str) -> String {
    let head = truncate_chars(content, NOTE_SUMMARY_MAX_CHARS);
    if head.len() < content.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}

/// Prefix of at most `max_chars` characters, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
