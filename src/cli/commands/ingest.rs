//! Ingest command implementation
//!
//! This module implements the `ingest` command: read the configured extracts,
//! assemble documents and write them to the configured sink.

use crate::adapters::sink::create_sink;
use crate::config::{load_config, MediQueryConfig};
use crate::core::pipeline::{PipelineCoordinator, RunAborted, RunStatistics};
use crate::domain::{Dialect, PipelineError, SinkError};
use crate::terminology::Terminology;
use clap::{Args, ValueEnum};
use std::sync::Arc;
use tokio::sync::watch;

/// Which extract to ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    Mimic,
    Synthea,
    All,
}

impl Dataset {
    pub fn dialects(&self) -> Vec<Dialect> {
        match self {
            Dataset::Mimic => vec![Dialect::Mimic],
            Dataset::Synthea => vec![Dialect::Synthea],
            Dataset::All => Dialect::ALL.to_vec(),
        }
    }
}

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Dataset to ingest
    #[arg(long, value_enum, default_value = "all")]
    pub dataset: Dataset,

    /// Override the configured batch size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Assemble documents without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Replace patient keys with digests for every dataset
    #[arg(long, conflicts_with = "no_anonymize")]
    pub anonymize: bool,

    /// Keep natural patient keys for every dataset
    #[arg(long)]
    pub no_anonymize: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl IngestArgs {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut MediQueryConfig) {
        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size = batch_size, "Overriding batch size from CLI");
            config.pipeline.batch_size = batch_size;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        let anonymize = match (self.anonymize, self.no_anonymize) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        if let Some(flag) = anonymize {
            tracing::info!(anonymize = flag, "Overriding anonymization from CLI");
            for dialect in Dialect::ALL {
                config.sources.get_mut(dialect).anonymize = Some(flag);
            }
        }
    }

    /// Execute the ingest command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(dataset = ?self.dataset, "Starting ingest command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let terminology = match Terminology::load(&config.terminology) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load terminology tables");
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let dry_run = config.application.dry_run;
        if dry_run {
            println!("🔍 DRY RUN MODE - No documents will be written");
            println!();
        }

        if !self.yes && !dry_run {
            println!("Ingest Configuration:");
            for dialect in self.dataset.dialects() {
                let source = config.sources.get(dialect);
                println!(
                    "  {}: {} ({}, anonymize: {})",
                    dialect.source_label(),
                    source.path,
                    if source.enabled { "enabled" } else { "disabled" },
                    config.sources.anonymize(dialect)
                );
            }
            println!("  Sink: {:?}", config.sink_target);
            println!("  Batch size: {}", config.pipeline.batch_size);
            println!();
            print!("Proceed with ingest? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Ingest cancelled.");
                return Ok(0);
            }
        }

        let sink = match create_sink(&config) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create sink");
                eprintln!("Failed to initialize sink: {e}");
                return Ok(2);
            }
        };

        println!("🚀 Starting ingest...");
        println!();

        let coordinator = PipelineCoordinator::new(config, terminology, sink, shutdown_signal)
            .with_dialects(self.dataset.dialects());

        match coordinator.run().await {
            Ok(stats) => {
                print_statistics(&stats);
                Ok(completed_exit_code(&stats))
            }
            Err(aborted) => {
                print_statistics(&aborted.statistics);
                eprintln!("❌ Ingest aborted: {}", aborted.cause);
                Ok(aborted_exit_code(&aborted))
            }
        }
    }
}

fn print_statistics(stats: &RunStatistics) {
    println!();
    println!("📊 Ingest Summary:");
    println!("  Run ID: {}", stats.run_id);
    println!("  Processed: {}", stats.processed);
    println!("  Indexed: {}", stats.documents_indexed);
    println!("  Failed: {}", stats.documents_failed);
    println!("  Errors: {}", stats.errors);
    println!("  Filtered: {}", stats.filtered);
    println!(
        "  Batches: {} ({} failed)",
        stats.batches_flushed, stats.batches_failed
    );
    println!("  Duration: {:.2}s", stats.duration_secs());
    println!("  Success Rate: {:.2}%", stats.success_rate());
    if !stats.sources_skipped.is_empty() {
        println!("  Skipped sources: {}", stats.sources_skipped.join(", "));
    }
    if !stats.stage_counts.is_empty() {
        println!("  Stages:");
        for (stage, count) in &stats.stage_counts {
            println!("    {stage}: {count}");
        }
    }
    println!();
}

/// 130 interrupted, 1 completed with errors, 0 clean
pub fn completed_exit_code(stats: &RunStatistics) -> i32 {
    if stats.interrupted {
        println!("⚠️  Ingest interrupted gracefully. Pending batches were written.");
        tracing::info!("Ingest interrupted by user signal");
        130
    } else if stats.is_clean() {
        println!("✅ Ingest completed successfully!");
        0
    } else {
        println!("⚠️  Ingest completed with errors");
        1
    }
}

/// 4 when the sink was unreachable, 5 for any other fatal error
pub fn aborted_exit_code(aborted: &RunAborted) -> i32 {
    match aborted.cause {
        PipelineError::Sink(SinkError::Unreachable(_)) => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> IngestArgs {
        IngestArgs {
            dataset: Dataset::All,
            batch_size: None,
            dry_run: false,
            anonymize: false,
            no_anonymize: false,
            yes: false,
        }
    }

    fn config() -> MediQueryConfig {
        toml::from_str(
            r#"
sink_target = "ndjson"

[ndjson]
output_dir = "out"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_dataset_dialects() {
        assert_eq!(Dataset::Mimic.dialects(), vec![Dialect::Mimic]);
        assert_eq!(Dataset::All.dialects().len(), 2);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = config();
        let args = IngestArgs {
            batch_size: Some(3),
            dry_run: true,
            no_anonymize: true,
            ..args()
        };
        args.apply_overrides(&mut config);

        assert_eq!(config.pipeline.batch_size, 3);
        assert!(config.application.dry_run);
        assert!(!config.sources.anonymize(Dialect::Mimic));
        assert!(!config.sources.anonymize(Dialect::Synthea));
    }

    #[test]
    fn test_no_overrides_keep_dialect_defaults() {
        let mut config = config();
        args().apply_overrides(&mut config);
        assert!(config.sources.anonymize(Dialect::Mimic));
        assert!(!config.sources.anonymize(Dialect::Synthea));
    }

    #[test]
    fn test_exit_codes() {
        let mut stats = RunStatistics::new();
        assert_eq!(completed_exit_code(&stats), 0);

        stats.errors = 1;
        assert_eq!(completed_exit_code(&stats), 1);

        stats.interrupted = true;
        assert_eq!(completed_exit_code(&stats), 130);

        let unreachable = RunAborted::new(
            RunStatistics::new(),
            SinkError::Unreachable("refused".to_string()).into(),
        );
        assert_eq!(aborted_exit_code(&unreachable), 4);

        let fatal = RunAborted::new(
            RunStatistics::new(),
            PipelineError::Other("boom".to_string()),
        );
        assert_eq!(aborted_exit_code(&fatal), 5);
    }
}
