//! Newline-delimited JSON file sink
//!
//! Appends one `{"_id", "_index", "_source"}` line per document to
//! `<output_dir>/<index>.ndjson`. Useful for dry runs against real data and
//! for loading into a cluster later.

use crate::adapters::sink::{BulkIndexResult, DocumentSink};
use crate::domain::{Result, SinkDocument, SinkError};
use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub struct NdjsonSink {
    output_dir: PathBuf,
}

impl NdjsonSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// File receiving documents for `index`
    pub fn index_path(&self, index: &str) -> PathBuf {
        self.output_dir.join(format!("{index}.ndjson"))
    }
}

#[async_trait]
impl DocumentSink for NdjsonSink {
    fn name(&self) -> &str {
        "ndjson"
    }

    async fn test_connection(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                SinkError::Unreachable(format!(
                    "cannot create output directory {}: {e}",
                    self.output_dir.display()
                ))
            })?;
        tracing::info!(output_dir = %self.output_dir.display(), "NDJSON output ready");
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: Vec<SinkDocument>,
    ) -> Result<BulkIndexResult> {
        if documents.is_empty() {
            return Ok(BulkIndexResult::default());
        }

        let mut buffer = String::new();
        for doc in &documents {
            let line = json!({ "_id": doc.id, "_index": index, "_source": doc.body });
            buffer.push_str(&serde_json::to_string(&line)?);
            buffer.push('\n');
        }

        let path = self.index_path(index);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| SinkError::WriteFailed(format!("{}: {e}", path.display())))?;

        file.write_all(buffer.as_bytes())
            .await
            .map_err(|e| SinkError::WriteFailed(format!("{}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| SinkError::WriteFailed(format!("{}: {e}", path.display())))?;

        Ok(BulkIndexResult::all_succeeded(documents.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PipelineError;
    use serde_json::Value;
    use tempfile::TempDir;

    fn doc(id: &str) -> SinkDocument {
        SinkDocument {
            id: id.to_string(),
            body: json!({ "id": id, "type": "lab_result" }),
        }
    }

    #[tokio::test]
    async fn test_bulk_index_appends_lines() {
        let dir = TempDir::new().unwrap();
        let sink = NdjsonSink::new(dir.path().join("out"));
        sink.test_connection().await.unwrap();

        let first = sink
            .bulk_index("lab-results", vec![doc("lab_1"), doc("lab_2")])
            .await
            .unwrap();
        assert_eq!(first.success_count, 2);
        sink.bulk_index("lab-results", vec![doc("lab_3")]).await.unwrap();

        let contents = std::fs::read_to_string(sink.index_path("lab-results")).unwrap();
        let lines: Vec<Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["_id"], "lab_1");
        assert_eq!(lines[0]["_index"], "lab-results");
        assert_eq!(lines[2]["_source"]["id"], "lab_3");
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_unreachable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let sink = NdjsonSink::new(blocker.join("out"));
        let err = sink.test_connection().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, PipelineError::Sink(SinkError::Unreachable(_))));
    }
}
