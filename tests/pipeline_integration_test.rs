//! End-to-end ingest runs over small CSV extracts written to a temp directory

use async_trait::async_trait;
use mediquery::adapters::sink::{BulkIndexResult, DocumentSink};
use mediquery::config::MediQueryConfig;
use mediquery::core::pipeline::PipelineCoordinator;
use mediquery::domain::{Dialect, PipelineError, Result, SinkDocument, SinkError};
use mediquery::terminology::Terminology;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::watch;

/// Records every bulk request it receives
#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<(String, Vec<SinkDocument>)>>,
    unreachable: bool,
}

impl RecordingSink {
    fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    fn batch_sizes(&self, index: &str) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(i, _)| i == index)
            .map(|(_, docs)| docs.len())
            .collect()
    }

    fn ids(&self, index: &str) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(i, _)| i == index)
            .flat_map(|(_, docs)| docs.iter().map(|d| d.id.clone()))
            .collect()
    }
}

#[async_trait]
impl DocumentSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn test_connection(&self) -> Result<()> {
        if self.unreachable {
            return Err(SinkError::Unreachable("connection refused".to_string()).into());
        }
        Ok(())
    }

    async fn bulk_index(&self, index: &str, documents: Vec<SinkDocument>) -> Result<BulkIndexResult> {
        let count = documents.len();
        self.batches
            .lock()
            .unwrap()
            .push((index.to_string(), documents));
        Ok(BulkIndexResult::all_succeeded(count))
    }
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn synthea_patients(count: usize) -> String {
    let mut csv = String::from("Id,BIRTHDATE,DEATHDATE,FIRST,LAST,GENDER,INCOME\n");
    for i in 0..count {
        csv.push_str(&format!(
            "p-{i:03},1970-03-0{},,Ada{i},Lovelace,F,52000\n",
            i % 9 + 1
        ));
    }
    csv
}

fn config(mimic: &Path, synthea: &Path, batch_size: usize) -> MediQueryConfig {
    let toml = format!(
        r#"
sink_target = "ndjson"

[ndjson]
output_dir = "unused"

[sources.mimic]
path = "{}"

[sources.synthea]
path = "{}"

[pipeline]
batch_size = {batch_size}
reference_date = "2024-01-01"
"#,
        mimic.display(),
        synthea.display()
    );
    toml::from_str(&toml).unwrap()
}

fn coordinator(
    config: MediQueryConfig,
    sink: Arc<RecordingSink>,
    dialects: Vec<Dialect>,
) -> (PipelineCoordinator, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    let coordinator =
        PipelineCoordinator::new(config, Arc::new(Terminology::builtin()), sink, rx)
            .with_dialects(dialects);
    (coordinator, tx)
}

#[tokio::test]
async fn test_malformed_row_is_counted_and_skipped() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();

    let mut csv = synthea_patients(9);
    // One field too many
    csv.push_str("p-bad,1980-01-01,,Extra,Field,M,1,unexpected\n");
    write(synthea.path(), "patients.csv", &csv);

    let sink = Arc::new(RecordingSink::default());
    let (coordinator, _tx) = coordinator(
        config(mimic.path(), synthea.path(), 100),
        sink.clone(),
        vec![Dialect::Synthea],
    );
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.processed, 9);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.documents_indexed, 9);
    assert_eq!(stats.stage(Dialect::Synthea, "rows_read"), 10);
    assert_eq!(sink.ids("patients").len(), 9);
    assert!(!stats.is_clean());
}

#[tokio::test]
async fn test_invalid_age_is_skipped() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();
    write(
        synthea.path(),
        "patients.csv",
        "Id,BIRTHDATE,DEATHDATE,FIRST,LAST,GENDER\n\
         p-1,1980-01-01,,Grace,Hopper,F\n\
         p-2,1800-01-01,,Too,Old,M\n\
         p-3,,,No,Birthdate,M\n",
    );

    let sink = Arc::new(RecordingSink::default());
    let (coordinator, _tx) = coordinator(
        config(mimic.path(), synthea.path(), 10),
        sink.clone(),
        vec![Dialect::Synthea],
    );
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 2);
    assert_eq!(sink.ids("patients"), vec!["synthea_patient_p-1".to_string()]);
}

#[tokio::test]
async fn test_batches_flush_at_size_boundary() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();
    write(synthea.path(), "patients.csv", &synthea_patients(7));

    let sink = Arc::new(RecordingSink::default());
    let (coordinator, _tx) = coordinator(
        config(mimic.path(), synthea.path(), 3),
        sink.clone(),
        vec![Dialect::Synthea],
    );
    let stats = coordinator.run().await.unwrap();

    assert_eq!(sink.batch_sizes("patients"), vec![3, 3, 1]);
    assert_eq!(stats.batches_flushed, 3);
    assert_eq!(stats.documents_indexed, 7);
    assert!(stats.is_clean());
}

#[tokio::test]
async fn test_document_ids_are_stable_across_runs() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();
    write(synthea.path(), "patients.csv", &synthea_patients(4));
    write(
        mimic.path(),
        "PATIENTS.csv",
        "ROW_ID,SUBJECT_ID,GENDER,DOB,DOD\n\
         1,249,F,1975-03-13 00:00:00,\n\
         2,250,M,1944-12-27 00:00:00,2008-11-22 00:00:00\n",
    );

    let mut runs = Vec::new();
    for _ in 0..2 {
        let cfg = config(mimic.path(), synthea.path(), 100);
        let sink = Arc::new(RecordingSink::default());
        let (coordinator, _tx) = coordinator(cfg, sink.clone(), Dialect::ALL.to_vec());
        coordinator.run().await.unwrap();
        runs.push(sink.ids("patients"));
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].len(), 6);
    // MIMIC-III keys are anonymized by default, Synthea keys are not
    assert!(runs[0].iter().all(|id| !id.starts_with("patient_")));
    assert!(runs[0].contains(&"synthea_patient_p-000".to_string()));
}

#[tokio::test]
async fn test_missing_primary_table_is_reported() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();
    write(synthea.path(), "patients.csv", &synthea_patients(2));

    let sink = Arc::new(RecordingSink::default());
    let (coordinator, _tx) = coordinator(
        config(mimic.path(), synthea.path(), 10),
        sink.clone(),
        Dialect::ALL.to_vec(),
    );
    let stats = coordinator.run().await.unwrap();

    assert!(stats
        .sources_skipped
        .contains(&"mimic.patients".to_string()));
    assert_eq!(stats.documents_indexed, 2);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();
    write(synthea.path(), "patients.csv", &synthea_patients(5));

    let mut cfg = config(mimic.path(), synthea.path(), 2);
    cfg.application.dry_run = true;

    // Dry runs do not need a reachable sink
    let sink = Arc::new(RecordingSink::unreachable());
    let (coordinator, _tx) = coordinator(cfg, sink.clone(), vec![Dialect::Synthea]);
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.processed, 5);
    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_shutdown_before_run_marks_interrupted() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();
    write(synthea.path(), "patients.csv", &synthea_patients(5));

    let sink = Arc::new(RecordingSink::default());
    let (coordinator, tx) = coordinator(
        config(mimic.path(), synthea.path(), 10),
        sink.clone(),
        vec![Dialect::Synthea],
    );
    tx.send(true).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert!(stats.interrupted);
    assert_eq!(stats.processed, 0);
    assert!(sink.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_sink_aborts_run() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();
    write(synthea.path(), "patients.csv", &synthea_patients(3));

    let sink = Arc::new(RecordingSink::unreachable());
    let (coordinator, _tx) = coordinator(
        config(mimic.path(), synthea.path(), 10),
        sink,
        vec![Dialect::Synthea],
    );
    let aborted = coordinator.run().await.unwrap_err();

    assert!(matches!(
        aborted.cause,
        PipelineError::Sink(SinkError::Unreachable(_))
    ));
    assert_eq!(aborted.statistics.processed, 0);
}

#[tokio::test]
async fn test_mimic_lab_events_and_notes() {
    let mimic = TempDir::new().unwrap();
    let synthea = TempDir::new().unwrap();
    write(
        mimic.path(),
        "PATIENTS.csv",
        "ROW_ID,SUBJECT_ID,GENDER,DOB,DOD\n1,10006,F,2094-03-05 00:00:00,\n",
    );
    write(
        mimic.path(),
        "LABEVENTS.csv",
        "ROW_ID,SUBJECT_ID,HADM_ID,ITEMID,CHARTTIME,VALUE,VALUENUM,VALUEUOM,FLAG\n\
         6244,10006,142345,50971,2164-10-23 21:09:00,4.1,4.1,mEq/L,\n\
         6245,10006,142345,50983,2164-10-23 21:09:00,,,mEq/L,\n",
    );
    write(
        mimic.path(),
        "NOTEEVENTS.csv",
        "ROW_ID,SUBJECT_ID,HADM_ID,CHARTDATE,CATEGORY,DESCRIPTION,TEXT\n\
         174,10006,142345,2164-10-28,Discharge summary,Report,\"Admission Date: stable\"\n",
    );

    let mut cfg = config(mimic.path(), synthea.path(), 10);
    cfg.pipeline.reference_date = chrono::NaiveDate::from_ymd_opt(2164, 11, 1);
    let sink = Arc::new(RecordingSink::default());
    let (coordinator, _tx) = coordinator(cfg, sink.clone(), vec![Dialect::Mimic]);
    let stats = coordinator.run().await.unwrap();

    assert_eq!(sink.ids("patients").len(), 1);
    assert_eq!(sink.ids("lab-results"), vec!["lab_6244".to_string()]);
    assert_eq!(sink.ids("clinical-notes"), vec!["note_174".to_string()]);
    assert_eq!(stats.filtered, 1);
    assert_eq!(stats.errors, 0);
}
