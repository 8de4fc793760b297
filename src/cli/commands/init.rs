//! Init command implementation
//!
//! Writes a sample `mediquery.toml` to get started with.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "mediquery.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing MediQuery configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Point [sources.mimic] and [sources.synthea] at your CSV extracts");
                println!("  2. Set MEDIQUERY_ES_API_KEY (or username/password) in .env");
                println!("  3. Validate configuration: mediquery validate-config");
                println!("  4. Try a dry run: mediquery ingest --dry-run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Sample configuration with every section and its defaults
    fn sample_config() -> String {
        r#"# MediQuery Configuration File
# Clinical CSV extracts to Elasticsearch

# development | staging | production
environment = "development"

# elasticsearch | ndjson
sink_target = "elasticsearch"

[application]
# trace, debug, info, warn, error
log_level = "info"
# Assemble documents without writing them
dry_run = false

[sources.mimic]
enabled = true
path = "data/mimic-iii"
# Replace SUBJECT_ID with a digest (default true for MIMIC-III)
anonymize = true

[sources.synthea]
enabled = true
path = "data/synthea/csv"
# Default false for synthetic data
anonymize = false

[pipeline]
# Documents per bulk request (1-10000)
batch_size = 1000
# Log progress every N rows
progress_interval = 50
# Hex characters kept in anonymized ids (8-64)
id_digest_len = 8
# Ages of living patients are computed against this date (default: today)
# reference_date = "2024-01-01"
include_lab_events = true
include_clinical_notes = true

[elasticsearch]
node = "http://localhost:9200"
# API key auth (preferred)
api_key = "${MEDIQUERY_ES_API_KEY}"
# Or basic auth
# username = "elastic"
# password = "${MEDIQUERY_ES_PASSWORD}"
timeout_seconds = 30
# Retries for throttled bulk requests (HTTP 429/503)
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 10000
# Cannot be disabled in production
tls_verify = true

[elasticsearch.indices]
patients = "patients"
lab_results = "lab-results"
clinical_notes = "clinical-notes"

# Used when sink_target = "ndjson"
# [ndjson]
# output_dir = "out"

[terminology]
# Replace the built-in crosswalk and classification tables
# tables_path = "terminology.toml"

[logging]
local_enabled = false
local_path = "/var/log/mediquery"
# daily | hourly
local_rotation = "daily"
"#
        .to_string()
    }
}
