//! Raw tabular rows
//!
//! A [`RawRow`] is one decoded CSV record together with the header of the
//! table it came from. Values stay as text; typed accessors interpret them on
//! demand and treat empty cells as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::sync::Arc;

/// One record of a source table
#[derive(Debug, Clone)]
pub struct RawRow {
    columns: Arc<Vec<String>>,
    values: StringRecord,
    line: u64,
}

impl RawRow {
    /// Create a row from a shared header and the decoded values
    pub fn new(columns: Arc<Vec<String>>, values: StringRecord, line: u64) -> Self {
        Self {
            columns,
            values,
            line,
        }
    }

    /// Build a standalone row from column/value pairs
    ///
    /// # Example
    ///
    /// ```
    /// use mediquery::domain::row::RawRow;
    ///
    /// let row = RawRow::from_pairs(&[("SUBJECT_ID", "10006"), ("GENDER", "F")]);
    /// assert_eq!(row.get("GENDER"), Some("F"));
    /// assert_eq!(row.get("DOD"), None);
    /// ```
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let columns = pairs.iter().map(|(k, _)| k.to_string()).collect();
        let values = pairs.iter().map(|(_, v)| *v).collect::<StringRecord>();
        Self::new(Arc::new(columns), values, 0)
    }

    /// 1-based line number in the source file (0 for synthetic rows)
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Trimmed value of a column, `None` when the column is missing or empty
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        let value = self.values.get(idx)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Value of a column or the given default
    pub fn get_or<'a>(&'a self, column: &str, default: &'a str) -> &'a str {
        self.get(column).unwrap_or(default)
    }

    /// Numeric value of a column
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column)?.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Timestamp value of a column
    pub fn get_datetime(&self, column: &str) -> Option<NaiveDateTime> {
        parse_datetime(self.get(column)?)
    }

    /// Date value of a column (time part dropped)
    pub fn get_date(&self, column: &str) -> Option<NaiveDate> {
        self.get_datetime(column).map(|dt| dt.date())
    }
}

/// Parse the date formats found in the supported extracts
///
/// Accepts `YYYY-MM-DD HH:MM:SS` (MIMIC-III), RFC 3339 (Synthea encounters),
/// `YYYY-MM-DDTHH:MM:SS` and bare `YYYY-MM-DD`.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_trims_and_hides_empty() {
        let row = RawRow::from_pairs(&[("A", "  x "), ("B", ""), ("C", "   ")]);
        assert_eq!(row.get("A"), Some("x"));
        assert_eq!(row.get("B"), None);
        assert_eq!(row.get("C"), None);
        assert_eq!(row.get("MISSING"), None);
        assert_eq!(row.get_or("B", "Unknown"), "Unknown");
    }

    #[test]
    fn test_get_f64() {
        let row = RawRow::from_pairs(&[("V", "5.5"), ("W", "abc"), ("N", "NaN")]);
        assert_eq!(row.get_f64("V"), Some(5.5));
        assert_eq!(row.get_f64("W"), None);
        assert_eq!(row.get_f64("N"), None);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let mimic = parse_datetime("2101-10-20 19:08:00").unwrap();
        assert_eq!(mimic.date(), NaiveDate::from_ymd_opt(2101, 10, 20).unwrap());

        let synthea = parse_datetime("2019-02-17T05:07:38Z").unwrap();
        assert_eq!(synthea.date(), NaiveDate::from_ymd_opt(2019, 2, 17).unwrap());

        let plain = parse_datetime("1960-03-01").unwrap();
        assert_eq!(plain.date(), NaiveDate::from_ymd_opt(1960, 3, 1).unwrap());

        assert!(parse_datetime("03/01/1960").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_get_date() {
        let row = RawRow::from_pairs(&[("DOB", "2094-03-05 00:00:00"), ("BAD", "soon")]);
        assert_eq!(
            row.get_date("DOB"),
            Some(NaiveDate::from_ymd_opt(2094, 3, 5).unwrap())
        );
        assert_eq!(row.get_date("BAD"), None);
    }
}
