//! Validate config command implementation
//!
//! Loads the configuration file, runs validation and checks that the
//! terminology tables and source directories can be found.

use crate::config::load_config;
use crate::config::schema::SinkTarget;
use crate::domain::Dialect;
use crate::terminology::Terminology;
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config also runs validation
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let terminology = match Terminology::load(&config.terminology) {
            Ok(t) => t,
            Err(e) => {
                println!("❌ Terminology tables could not be loaded");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);

        for dialect in Dialect::ALL {
            let source = config.sources.get(dialect);
            let status = if !source.enabled {
                "disabled"
            } else if Path::new(&source.path).is_dir() {
                "found"
            } else {
                "⚠️  directory not found"
            };
            println!(
                "  {} Source: {} ({status}, anonymize: {})",
                dialect.source_label(),
                source.path,
                config.sources.anonymize(dialect)
            );
        }

        match config.sink_target {
            SinkTarget::Elasticsearch => {
                if let Some(ref es) = config.elasticsearch {
                    println!("  Sink: Elasticsearch at {}", es.node);
                    println!(
                        "  Indices: {}, {}, {}",
                        es.indices.patients, es.indices.lab_results, es.indices.clinical_notes
                    );
                    println!("  TLS Verify: {}", es.tls_verify);
                }
            }
            SinkTarget::Ndjson => {
                if let Some(ref ndjson) = config.ndjson {
                    println!("  Sink: NDJSON files in {}", ndjson.output_dir);
                }
            }
        }

        println!("  Batch Size: {}", config.pipeline.batch_size);
        println!("  ID Digest Length: {}", config.pipeline.id_digest_len);
        match config.pipeline.reference_date {
            Some(date) => println!("  Reference Date: {date}"),
            None => println!("  Reference Date: today"),
        }
        println!(
            "  Terminology: {} ({} crosswalk entries)",
            terminology.version,
            terminology.crosswalk.len()
        );
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"sink_target = \"ndjson\"\n\n[ndjson]\noutput_dir = \"out\"\n")
            .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}
            .execute("does-not-exist.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
