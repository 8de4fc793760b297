//! Lazy CSV row streams
//!
//! Each stream is single-pass: rows are decoded as they are pulled, so only
//! the current record is held in memory. Malformed rows surface as `Err`
//! items and the stream carries on with the next record.

use super::tables::LogicalTable;
use crate::domain::{Dialect, RawRow, SourceError};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opens the tables of one dialect under a root directory
#[derive(Debug, Clone)]
pub struct SourceReader {
    root: PathBuf,
    dialect: Dialect,
}

impl SourceReader {
    pub fn new(root: impl Into<PathBuf>, dialect: Dialect) -> Self {
        Self {
            root: root.into(),
            dialect,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, table: LogicalTable) -> Result<PathBuf, SourceError> {
        let file_name = table
            .file_name(self.dialect)
            .ok_or_else(|| SourceError::Unavailable {
                table: table.to_string(),
                path: format!("<no {} table in {}>", table, self.dialect),
            })?;
        Ok(self.root.join(file_name))
    }

    /// Open a primary table; a missing file is an error
    pub fn open_required(&self, table: LogicalTable) -> Result<RowStream, SourceError> {
        let path = self.path_for(table)?;
        if !path.is_file() {
            return Err(SourceError::Unavailable {
                table: table.to_string(),
                path: path.display().to_string(),
            });
        }
        RowStream::open(table.to_string(), &path)
    }

    /// Open a child table; a missing file yields an empty stream and a warning
    pub fn open_optional(&self, table: LogicalTable) -> Result<RowStream, SourceError> {
        let path = match self.path_for(table) {
            Ok(path) if path.is_file() => path,
            Ok(path) => {
                tracing::warn!(
                    dialect = %self.dialect,
                    table = %table,
                    path = %path.display(),
                    "Optional source table not found, continuing without it"
                );
                return Ok(RowStream::empty(table.to_string()));
            }
            Err(_) => return Ok(RowStream::empty(table.to_string())),
        };
        RowStream::open(table.to_string(), &path)
    }
}

/// Single-pass iterator over the rows of one table
pub struct RowStream {
    table: String,
    columns: Arc<Vec<String>>,
    records: Option<StringRecordsIntoIter<File>>,
}

impl RowStream {
    fn open(table: String, path: &Path) -> Result<Self, SourceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| SourceError::Unavailable {
                table: table.clone(),
                path: format!("{} ({})", path.display(), e),
            })?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| SourceError::Io(format!("read headers of {}: {}", path.display(), e)))?
            .iter()
            .map(|h| h.trim().trim_matches('\u{feff}').to_string())
            .collect();

        tracing::debug!(
            table = %table,
            path = %path.display(),
            columns = columns.len(),
            "Opened source table"
        );

        Ok(Self {
            table,
            columns: Arc::new(columns),
            records: Some(reader.into_records()),
        })
    }

    /// A stream that yields nothing
    pub fn empty(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Arc::new(Vec::new()),
            records: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Iterator for RowStream {
    type Item = Result<RawRow, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.as_mut()?.next()?;
        Some(match record {
            Ok(record) => {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                Ok(RawRow::new(Arc::clone(&self.columns), record, line))
            }
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                // nothing more can be read from a failed handle
                self.records = None;
                Err(SourceError::Io(format!("{}: {}", self.table, e)))
            }
            Err(e) => Err(SourceError::MalformedRow {
                table: self.table.clone(),
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            }),
        })
    }
}
