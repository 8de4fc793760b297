//! Configuration management for MediQuery.
//!
//! Configuration lives in a TOML file (`mediquery.toml` by default) with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `MEDIQUERY_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//! sink_target = "elasticsearch"
//!
//! [application]
//! log_level = "info"
//!
//! [sources.mimic]
//! path = "/data/mimic-iii-demo"
//!
//! [sources.synthea]
//! path = "/data/synthea/csv"
//! anonymize = false
//!
//! [pipeline]
//! batch_size = 1000
//! reference_date = "2024-01-01"
//!
//! [elasticsearch]
//! node = "https://search.example.org:9200"
//! api_key = "${MEDIQUERY_ES_API_KEY}"
//!
//! [elasticsearch.indices]
//! patients = "patients"
//! lab_results = "lab-results"
//! clinical_notes = "clinical-notes"
//! ```
//!
//! ```rust,no_run
//! use mediquery::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("mediquery.toml")?;
//! println!("Batch size: {}", config.pipeline.batch_size);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ElasticsearchConfig, Environment, IndexNames, LoggingConfig,
    MediQueryConfig, NdjsonConfig, PipelineConfig, SinkTarget, SourceConfig, SourcesConfig,
    TerminologyConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
