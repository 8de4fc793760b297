//! Child-table indexes keyed by patient
//!
//! Child tables are consumed once and grouped by the patient key column so
//! that each patient row can pick up its diagnoses, prescriptions and the
//! like without rescanning files.

use crate::domain::{RawRow, SourceError};
use std::collections::HashMap;

/// Rows of one child table grouped by a key column
#[derive(Debug, Default)]
pub struct ChildIndex {
    table: String,
    rows: HashMap<String, Vec<RawRow>>,
    indexed: u64,
    malformed: u64,
    unkeyed: u64,
}

impl ChildIndex {
    /// Consume a row stream, grouping rows by `key_column`
    ///
    /// Malformed rows and rows without a key are logged and counted, never
    /// fatal.
    pub fn build<I>(table: impl Into<String>, rows: I, key_column: &str) -> Self
    where
        I: IntoIterator<Item = Result<RawRow, SourceError>>,
    {
        let mut index = Self {
            table: table.into(),
            ..Self::default()
        };

        for item in rows {
            match item {
                Ok(row) => match row.get(key_column).map(str::to_string) {
                    Some(key) => {
                        index.rows.entry(key).or_default().push(row);
                        index.indexed += 1;
                    }
                    None => {
                        tracing::debug!(
                            table = %index.table,
                            line = row.line(),
                            column = key_column,
                            "Child row has no patient key, skipping"
                        );
                        index.unkeyed += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!(table = %index.table, error = %e, "Skipping malformed child row");
                    index.malformed += 1;
                }
            }
        }

        tracing::debug!(
            table = %index.table,
            rows = index.indexed,
            patients = index.rows.len(),
            malformed = index.malformed,
            "Built child index"
        );
        index
    }

    pub fn empty(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Rows for one key, in file order
    pub fn get(&self, key: &str) -> &[RawRow] {
        self.rows.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn indexed(&self) -> u64 {
        self.indexed
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    pub fn unkeyed(&self) -> u64 {
        self.unkeyed
    }
}

/// Code-to-label dictionary built from a reference table
#[derive(Debug, Default, Clone)]
pub struct LookupTable {
    entries: HashMap<String, String>,
    malformed: u64,
}

impl LookupTable {
    pub fn build<I>(rows: I, key_column: &str, value_column: &str) -> Self
    where
        I: IntoIterator<Item = Result<RawRow, SourceError>>,
    {
        let mut table = Self::default();
        for item in rows {
            match item {
                Ok(row) => {
                    if let (Some(key), Some(value)) = (row.get(key_column), row.get(value_column))
                    {
                        table.entries.insert(key.to_string(), value.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed dictionary row");
                    table.malformed += 1;
                }
            }
        }
        table
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}
