//! Pipeline coordinator - main orchestrator for an ingest run
//!
//! For each enabled dialect the coordinator builds the child-table indexes,
//! streams the primary table through the assembler and hands documents to a
//! [`BatchSink`] per index. Row-level failures are counted and skipped; only
//! an unreachable sink ends the run early.

use super::batch::BatchSink;
use super::stats::{RunAborted, RunStatistics};
use crate::adapters::sink::DocumentSink;
use crate::config::MediQueryConfig;
use crate::core::assemble::mimic::{MimicAssembler, MimicChildren};
use crate::core::assemble::synthea::{SyntheaAssembler, SyntheaChildren};
use crate::core::assemble::{AssembleOutcome, AssemblyContext, SkipReason};
use crate::core::source::{ChildIndex, LogicalTable, LookupTable, RowStream, SourceReader};
use crate::domain::{Dialect, IndexDocument, RawRow, Result};
use crate::terminology::Terminology;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::watch;

/// Pipeline coordinator
pub struct PipelineCoordinator {
    config: MediQueryConfig,
    terminology: Arc<Terminology>,
    sink: Arc<dyn DocumentSink>,
    shutdown_signal: watch::Receiver<bool>,
    dialects: Vec<Dialect>,
}

impl PipelineCoordinator {
    pub fn new(
        config: MediQueryConfig,
        terminology: Arc<Terminology>,
        sink: Arc<dyn DocumentSink>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            terminology,
            sink,
            shutdown_signal,
            dialects: Dialect::ALL.to_vec(),
        }
    }

    /// Restrict the run to the given dialects
    pub fn with_dialects(mut self, dialects: Vec<Dialect>) -> Self {
        self.dialects = dialects;
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        *self.shutdown_signal.borrow()
    }

    fn dry_run(&self) -> bool {
        self.config.application.dry_run
    }

    fn reference_date(&self) -> NaiveDate {
        self.config
            .pipeline
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    fn context(&self, dialect: Dialect) -> AssemblyContext {
        AssemblyContext::new(
            self.reference_date(),
            self.config.sources.anonymize(dialect),
            self.config.pipeline.id_digest_len,
        )
    }

    fn batch_sink(&self, index: &str) -> BatchSink {
        BatchSink::new(
            self.sink.clone(),
            index,
            self.config.pipeline.batch_size,
            self.dry_run(),
        )
    }

    /// Execute the run
    ///
    /// 1. Checks sink connectivity (skipped in dry-run mode)
    /// 2. For each enabled dialect, ingests patients, then MIMIC-III lab
    ///    events and notes when configured
    /// 3. Logs and returns the run statistics
    ///
    /// # Errors
    ///
    /// Returns [`RunAborted`] with the statistics gathered so far when the
    /// sink becomes unreachable.
    pub async fn run(&self) -> std::result::Result<RunStatistics, RunAborted> {
        let mut stats = RunStatistics::new();

        tracing::info!(
            run_id = %stats.run_id,
            sink = %self.sink.name(),
            dry_run = self.dry_run(),
            batch_size = self.config.pipeline.batch_size,
            "Starting ingest run"
        );

        if self.dry_run() {
            tracing::info!("Dry run: documents are assembled but not written");
        } else if let Err(e) = self.sink.test_connection().await {
            tracing::error!(error = %e, "Sink connectivity check failed");
            return Err(RunAborted::new(stats, e));
        }

        for &dialect in &self.dialects {
            if stats.interrupted || self.is_shutdown_requested() {
                stats.interrupted = true;
                break;
            }

            let source = self.config.sources.get(dialect);
            if !source.enabled {
                tracing::info!(dialect = %dialect, "Source disabled, skipping");
                continue;
            }

            let outcome = match dialect {
                Dialect::Mimic => self.ingest_mimic(&mut stats).await,
                Dialect::Synthea => self.ingest_synthea(&mut stats).await,
            };

            if let Err(e) = outcome {
                tracing::error!(dialect = %dialect, error = %e, "Ingest run aborted");
                stats.log_summary();
                return Err(RunAborted::new(stats, e));
            }
        }

        stats.finish();
        stats.log_summary();
        Ok(stats)
    }

    async fn ingest_mimic(&self, stats: &mut RunStatistics) -> Result<()> {
        let dialect = Dialect::Mimic;
        let reader = SourceReader::new(&self.config.sources.mimic.path, dialect);
        let indices = self.config.indices();

        let admissions = self.child_index(&reader, LogicalTable::Admissions, stats);
        let diagnoses = self.child_index(&reader, LogicalTable::Diagnoses, stats);
        let prescriptions = self.child_index(&reader, LogicalTable::Prescriptions, stats);
        let titles = self.lookup(
            &reader,
            LogicalTable::DiagnosisDictionary,
            "ICD9_CODE",
            "LONG_TITLE",
            stats,
        );
        let lab_items = self.lookup(&reader, LogicalTable::LabItems, "ITEMID", "LABEL", stats);

        let assembler = MimicAssembler::new(self.terminology.clone(), self.context(dialect))
            .with_diagnosis_titles(titles)
            .with_lab_items(lab_items);

        if let Some(rows) = self.open_primary(&reader, LogicalTable::Patients, stats) {
            self.ingest_stream(dialect, rows, &indices.patients, stats, |row| {
                let key = row.get("SUBJECT_ID").unwrap_or_default();
                let children = MimicChildren {
                    admissions: admissions.get(key),
                    diagnoses: diagnoses.get(key),
                    prescriptions: prescriptions.get(key),
                };
                assembler.assemble_patient(row, children)
            })
            .await?;
        }

        if self.config.pipeline.include_lab_events && !stats.interrupted {
            if let Some(rows) = self.open_primary(&reader, LogicalTable::LabEvents, stats) {
                self.ingest_stream(dialect, rows, &indices.lab_results, stats, |row| {
                    assembler.assemble_lab_event(row)
                })
                .await?;
            }
        }

        if self.config.pipeline.include_clinical_notes && !stats.interrupted {
            if let Some(rows) = self.open_primary(&reader, LogicalTable::NoteEvents, stats) {
                self.ingest_stream(dialect, rows, &indices.clinical_notes, stats, |row| {
                    assembler.assemble_note(row)
                })
                .await?;
            }
        }

        Ok(())
    }

    async fn ingest_synthea(&self, stats: &mut RunStatistics) -> Result<()> {
        let dialect = Dialect::Synthea;
        let reader = SourceReader::new(&self.config.sources.synthea.path, dialect);
        let indices = self.config.indices();

        let encounters = self.child_index(&reader, LogicalTable::Encounters, stats);
        let conditions = self.child_index(&reader, LogicalTable::Conditions, stats);
        let medications = self.child_index(&reader, LogicalTable::Medications, stats);
        let observations = self.child_index(&reader, LogicalTable::Observations, stats);

        let assembler = SyntheaAssembler::new(self.terminology.clone(), self.context(dialect));

        if let Some(rows) = self.open_primary(&reader, LogicalTable::Patients, stats) {
            self.ingest_stream(dialect, rows, &indices.patients, stats, |row| {
                let key = row.get("Id").unwrap_or_default();
                let children = SyntheaChildren {
                    encounters: encounters.get(key),
                    conditions: conditions.get(key),
                    medications: medications.get(key),
                    observations: observations.get(key),
                };
                assembler.assemble_patient(row, children)
            })
            .await?;
        }

        Ok(())
    }

    /// Open a primary table, recording a skipped source when it is missing
    fn open_primary(
        &self,
        reader: &SourceReader,
        table: LogicalTable,
        stats: &mut RunStatistics,
    ) -> Option<RowStream> {
        match reader.open_required(table) {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::warn!(
                    dialect = %reader.dialect(),
                    table = %table,
                    error = %e,
                    "Primary table unavailable, skipping stream"
                );
                stats.skip_source(format!("{}.{}", reader.dialect().as_str(), table.as_str()));
                None
            }
        }
    }

    /// Hold a child table in memory, grouped by patient key
    fn child_index(
        &self,
        reader: &SourceReader,
        table: LogicalTable,
        stats: &mut RunStatistics,
    ) -> ChildIndex {
        let dialect = reader.dialect();
        let index = match reader.open_optional(table) {
            Ok(rows) => ChildIndex::build(table.as_str(), rows, table.patient_key_column(dialect)),
            Err(e) => {
                tracing::warn!(dialect = %dialect, table = %table, error = %e, "Child table unreadable");
                stats.errors += 1;
                ChildIndex::empty(table.as_str())
            }
        };

        stats.errors += index.malformed();
        stats.count_stage(dialect, "child_rows_indexed", index.indexed());
        stats.count_stage(dialect, "malformed_child_rows", index.malformed());
        index
    }

    fn lookup(
        &self,
        reader: &SourceReader,
        table: LogicalTable,
        key_column: &str,
        value_column: &str,
        stats: &mut RunStatistics,
    ) -> LookupTable {
        let dialect = reader.dialect();
        match reader.open_optional(table) {
            Ok(rows) => {
                let lookup = LookupTable::build(rows, key_column, value_column);
                stats.errors += lookup.malformed();
                stats.count_stage(dialect, "malformed_child_rows", lookup.malformed());
                tracing::debug!(table = %table, entries = lookup.len(), "Loaded dictionary");
                lookup
            }
            Err(e) => {
                tracing::warn!(dialect = %dialect, table = %table, error = %e, "Dictionary unreadable");
                stats.errors += 1;
                LookupTable::default()
            }
        }
    }

    /// Stream one primary table into one index
    async fn ingest_stream<T, F>(
        &self,
        dialect: Dialect,
        rows: RowStream,
        index: &str,
        stats: &mut RunStatistics,
        assemble: F,
    ) -> Result<()>
    where
        T: IndexDocument,
        F: FnMut(&RawRow) -> AssembleOutcome<T>,
    {
        let table = rows.table().to_string();
        let mut batch = self.batch_sink(index);

        tracing::info!(dialect = %dialect, table = %table, index = %index, "Ingesting table");

        // The pending batch is written even when the stream stops early
        let streamed = self
            .drive(dialect, rows, &mut batch, stats, assemble)
            .await;
        let drained = match streamed {
            Ok(()) => batch.finish().await,
            Err(e) => Err(e),
        };
        stats.record_batches(batch.result());

        tracing::info!(
            dialect = %dialect,
            table = %table,
            indexed = batch.result().documents_indexed,
            failed = batch.result().documents_failed,
            "Finished table"
        );
        drained
    }

    async fn drive<T, F>(
        &self,
        dialect: Dialect,
        rows: RowStream,
        batch: &mut BatchSink,
        stats: &mut RunStatistics,
        mut assemble: F,
    ) -> Result<()>
    where
        T: IndexDocument,
        F: FnMut(&RawRow) -> AssembleOutcome<T>,
    {
        let progress_interval = self.config.pipeline.progress_interval.max(1) as u64;
        let table = rows.table().to_string();
        let mut seen: u64 = 0;

        for item in rows {
            if self.is_shutdown_requested() {
                tracing::warn!(dialect = %dialect, table = %table, rows = seen, "Shutdown requested, stopping stream");
                stats.interrupted = true;
                break;
            }

            seen += 1;
            stats.count_stage(dialect, "rows_read", 1);

            let row = match item {
                Ok(row) => row,
                Err(e) => {
                    crate::log_record_skipped!(dialect, None::<u64>, e);
                    stats.errors += 1;
                    continue;
                }
            };

            match assemble(&row) {
                AssembleOutcome::Assembled(doc) => match doc.to_sink_document() {
                    Ok(document) => {
                        stats.processed += 1;
                        stats.count_stage(dialect, "documents_assembled", 1);
                        batch.submit(document).await?;
                    }
                    Err(e) => {
                        crate::log_record_skipped!(dialect, Some(row.line()), e);
                        stats.errors += 1;
                    }
                },
                AssembleOutcome::Skipped(SkipReason::Invalid(e)) => {
                    crate::log_record_skipped!(dialect, Some(row.line()), e);
                    stats.errors += 1;
                }
                AssembleOutcome::Skipped(SkipReason::Filtered(reason)) => {
                    tracing::debug!(dialect = %dialect, line = row.line(), reason = reason, "Filtered row");
                    stats.filtered += 1;
                }
            }

            if seen % progress_interval == 0 {
                tracing::info!(
                    dialect = %dialect,
                    table = %table,
                    rows = seen,
                    processed = stats.processed,
                    errors = stats.errors,
                    "Progress"
                );
            }
        }

        Ok(())
    }
}
