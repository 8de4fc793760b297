//! Configuration schema types
//!
//! This module defines the configuration structure for MediQuery. Every
//! section validates itself and returns a descriptive message on failure.

use crate::config::SecretString;
use crate::domain::Dialect;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where assembled documents are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkTarget {
    /// Elasticsearch `_bulk` API
    #[default]
    Elasticsearch,
    /// Newline-delimited JSON files, one per index
    Ndjson,
}

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main MediQuery configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediQueryConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Source extract locations
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Batching and assembly settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Sink selection (elasticsearch or ndjson)
    #[serde(default)]
    pub sink_target: SinkTarget,

    /// Elasticsearch configuration (required if sink_target = elasticsearch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<ElasticsearchConfig>,

    /// NDJSON output configuration (required if sink_target = ndjson)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ndjson: Option<NdjsonConfig>,

    /// Crosswalk and classification tables
    #[serde(default)]
    pub terminology: TerminologyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MediQueryConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.sources.validate()?;
        self.pipeline.validate()?;

        // Both sink sections may be present; only the active one is validated
        match self.sink_target {
            SinkTarget::Elasticsearch => match self.elasticsearch {
                Some(ref config) => config.validate(&self.environment)?,
                None => {
                    return Err(
                        "elasticsearch configuration is required when sink_target = 'elasticsearch'"
                            .to_string(),
                    )
                }
            },
            SinkTarget::Ndjson => match self.ndjson {
                Some(ref config) => config.validate()?,
                None => {
                    return Err(
                        "ndjson configuration is required when sink_target = 'ndjson'".to_string()
                    )
                }
            },
        }

        self.logging.validate()?;
        Ok(())
    }

    /// Index names used by the active sink
    pub fn indices(&self) -> IndexNames {
        self.elasticsearch
            .as_ref()
            .map(|es| es.indices.clone())
            .unwrap_or_default()
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (assemble documents but don't write them)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// One source extract directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Whether this dialect is ingested
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding the CSV tables
    pub path: String,

    /// Replace natural keys with digests; defaults per dialect when unset
    #[serde(default)]
    pub anonymize: Option<bool>,
}

/// Source extracts per dialect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_mimic_source")]
    pub mimic: SourceConfig,

    #[serde(default = "default_synthea_source")]
    pub synthea: SourceConfig,
}

impl SourcesConfig {
    fn validate(&self) -> Result<(), String> {
        for dialect in Dialect::ALL {
            let source = self.get(dialect);
            if source.enabled && source.path.trim().is_empty() {
                return Err(format!(
                    "sources.{}.path cannot be empty when the source is enabled",
                    dialect.as_str()
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, dialect: Dialect) -> &SourceConfig {
        match dialect {
            Dialect::Mimic => &self.mimic,
            Dialect::Synthea => &self.synthea,
        }
    }

    pub fn get_mut(&mut self, dialect: Dialect) -> &mut SourceConfig {
        match dialect {
            Dialect::Mimic => &mut self.mimic,
            Dialect::Synthea => &mut self.synthea,
        }
    }

    /// Effective anonymization flag: MIMIC-III defaults on, Synthea off
    pub fn anonymize(&self, dialect: Dialect) -> bool {
        self.get(dialect)
            .anonymize
            .unwrap_or(dialect == Dialect::Mimic)
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            mimic: default_mimic_source(),
            synthea: default_synthea_source(),
        }
    }
}

/// Batching and assembly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Documents per sink write (1-10000)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Log progress every N primary rows
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Hex characters kept from the anonymization digest (8-64)
    #[serde(default = "default_id_digest_len")]
    pub id_digest_len: usize,

    /// Age reference for living patients, as a quoted `YYYY-MM-DD`; today when unset
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,

    /// Emit MIMIC-III lab-result documents
    #[serde(default = "default_true")]
    pub include_lab_events: bool,

    /// Emit MIMIC-III clinical-note documents
    #[serde(default = "default_true")]
    pub include_clinical_notes: bool,
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 || self.batch_size > 10000 {
            return Err(format!(
                "pipeline.batch_size must be between 1 and 10000, got {}",
                self.batch_size
            ));
        }

        if self.progress_interval == 0 {
            return Err("pipeline.progress_interval must be > 0".to_string());
        }

        if !(8..=64).contains(&self.id_digest_len) {
            return Err(format!(
                "pipeline.id_digest_len must be between 8 and 64, got {}",
                self.id_digest_len
            ));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            progress_interval: default_progress_interval(),
            id_digest_len: default_id_digest_len(),
            reference_date: None,
            include_lab_events: true,
            include_clinical_notes: true,
        }
    }
}

/// Target index names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexNames {
    #[serde(default = "default_patients_index")]
    pub patients: String,

    #[serde(default = "default_lab_results_index")]
    pub lab_results: String,

    #[serde(default = "default_clinical_notes_index")]
    pub clinical_notes: String,
}

impl Default for IndexNames {
    fn default() -> Self {
        Self {
            patients: default_patients_index(),
            lab_results: default_lab_results_index(),
            clinical_notes: default_clinical_notes_index(),
        }
    }
}

/// Elasticsearch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Cluster URL
    #[serde(default = "default_es_node")]
    pub node: String,

    /// API key (sent as `Authorization: ApiKey ...`)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Username for basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retries for throttled bulk requests (HTTP 429/503)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// First backoff delay in milliseconds, doubled on every retry
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for the backoff delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// TLS certificate verification enabled
    ///
    /// Disabling verification is rejected in production environments.
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    #[serde(default)]
    pub indices: IndexNames,
}

impl ElasticsearchConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.node.is_empty() {
            return Err("elasticsearch.node cannot be empty".to_string());
        }

        if url::Url::parse(&self.node).is_err()
            || !(self.node.starts_with("http://") || self.node.starts_with("https://"))
        {
            return Err("elasticsearch.node must be an http:// or https:// URL".to_string());
        }

        if let Some(ref key) = self.api_key {
            if key.expose_secret().is_empty() {
                return Err("elasticsearch.api_key cannot be empty when set".to_string());
            }
        }

        match (&self.username, &self.password) {
            (Some(user), _) if user.is_empty() => {
                return Err("elasticsearch.username cannot be empty when set".to_string());
            }
            (Some(_), None) => {
                return Err(
                    "elasticsearch.password is required when username is set".to_string()
                );
            }
            (None, Some(_)) => {
                return Err(
                    "elasticsearch.username is required when password is set".to_string()
                );
            }
            _ => {}
        }

        if self.timeout_seconds == 0 {
            return Err("elasticsearch.timeout_seconds must be > 0".to_string());
        }

        if self.max_retries > 10 {
            return Err(format!(
                "elasticsearch.max_retries must be <= 10, got {}",
                self.max_retries
            ));
        }

        for (name, index) in [
            ("patients", &self.indices.patients),
            ("lab_results", &self.indices.lab_results),
            ("clinical_notes", &self.indices.clinical_notes),
        ] {
            if index.is_empty() {
                return Err(format!("elasticsearch.indices.{name} cannot be empty"));
            }
        }

        // Security: TLS verification is mandatory in production
        if *environment == Environment::Production && !self.tls_verify {
            return Err(
                "TLS certificate verification cannot be disabled in production environments. \
                Set 'tls_verify = true', or use 'environment = \"development\"' or \
                'environment = \"staging\"' for testing."
                    .to_string(),
            );
        }

        Ok(())
    }
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            node: default_es_node(),
            api_key: None,
            username: None,
            password: None,
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            tls_verify: true,
            indices: IndexNames::default(),
        }
    }
}

/// NDJSON file sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NdjsonConfig {
    /// Directory receiving `<index>.ndjson` files
    pub output_dir: String,
}

impl NdjsonConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("ndjson.output_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Crosswalk and classification tables
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TerminologyConfig {
    /// TOML file replacing the built-in tables
    #[serde(default)]
    pub tables_path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when file logging is enabled".to_string());
        }

        Ok(())
    }

    /// Console-only logging, used before the configuration is loaded
    pub fn console_only() -> Self {
        Self {
            local_enabled: false,
            local_path: String::new(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_mimic_source() -> SourceConfig {
    SourceConfig {
        enabled: true,
        path: "data/mimic-iii".to_string(),
        anonymize: None,
    }
}

fn default_synthea_source() -> SourceConfig {
    SourceConfig {
        enabled: true,
        path: "data/synthea".to_string(),
        anonymize: None,
    }
}

fn default_batch_size() -> usize {
    1000
}

fn default_progress_interval() -> usize {
    50
}

fn default_id_digest_len() -> usize {
    8
}

fn default_patients_index() -> String {
    "patients".to_string()
}

fn default_lab_results_index() -> String {
    "lab-results".to_string()
}

fn default_clinical_notes_index() -> String {
    "clinical-notes".to_string()
}

fn default_es_node() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10000
}

fn default_local_path() -> String {
    "/var/log/mediquery".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret::SecretValue;
    use secrecy::Secret;

    fn es_config() -> ElasticsearchConfig {
        ElasticsearchConfig {
            node: "https://es.example.com:9200".to_string(),
            username: Some("elastic".to_string()),
            password: Some(Secret::new(SecretValue::from("changeme".to_string()))),
            ..ElasticsearchConfig::default()
        }
    }

    fn config() -> MediQueryConfig {
        MediQueryConfig {
            application: ApplicationConfig::default(),
            environment: Environment::Development,
            sources: SourcesConfig::default(),
            pipeline: PipelineConfig::default(),
            sink_target: SinkTarget::Elasticsearch,
            elasticsearch: Some(es_config()),
            ndjson: None,
            terminology: TerminologyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
            dry_run: false,
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_config_validation() {
        let mut config = PipelineConfig::default();
        assert!(config.validate().is_ok());

        config.batch_size = 0;
        assert!(config.validate().is_err());

        config.batch_size = 10001;
        assert!(config.validate().is_err());

        config.batch_size = 3;
        config.id_digest_len = 7;
        assert!(config.validate().is_err());

        config.id_digest_len = 64;
        assert!(config.validate().is_ok());

        config.progress_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sink_section_required() {
        let mut config = config();
        assert!(config.validate().is_ok());

        config.elasticsearch = None;
        let err = config.validate().unwrap_err();
        assert!(err.contains("elasticsearch configuration is required"));

        config.sink_target = SinkTarget::Ndjson;
        assert!(config.validate().is_err());

        config.ndjson = Some(NdjsonConfig {
            output_dir: "out".to_string(),
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_elasticsearch_credentials() {
        let mut config = es_config();
        assert!(config.validate(&Environment::Development).is_ok());

        config.password = None;
        assert!(config.validate(&Environment::Development).is_err());

        config.username = None;
        assert!(config.validate(&Environment::Development).is_ok());

        config.node = "localhost:9200".to_string();
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_elasticsearch_tls_verification_in_production() {
        let mut config = es_config();
        config.tls_verify = false;

        let result = config.validate(&Environment::Production);
        assert!(result
            .unwrap_err()
            .contains("TLS certificate verification cannot be disabled in production"));

        assert!(config.validate(&Environment::Development).is_ok());
        assert!(config.validate(&Environment::Staging).is_ok());
    }

    #[test]
    fn test_sources_validation_and_anonymize_defaults() {
        let mut sources = SourcesConfig::default();
        assert!(sources.anonymize(Dialect::Mimic));
        assert!(!sources.anonymize(Dialect::Synthea));

        sources.synthea.anonymize = Some(true);
        assert!(sources.anonymize(Dialect::Synthea));

        sources.mimic.path = String::new();
        assert!(sources.validate().is_err());

        sources.mimic.enabled = false;
        assert!(sources.validate().is_ok());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_path, "/var/log/mediquery");
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());

        let bad = LoggingConfig {
            local_rotation: "weekly".to_string(),
            ..LoggingConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_batch_size(), 1000);
        assert_eq!(default_progress_interval(), 50);
        assert_eq!(default_id_digest_len(), 8);
        assert_eq!(default_max_retries(), 3);
        assert_eq!(IndexNames::default().lab_results, "lab-results");
    }
}
