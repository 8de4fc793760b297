//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{MediQueryConfig, SinkTarget};
use super::secret::secret_string;
use crate::domain::errors::PipelineError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into MediQueryConfig
/// 4. Applies environment variable overrides (MEDIQUERY_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a [`PipelineError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation
/// rejects a value.
///
/// # Examples
///
/// ```no_run
/// use mediquery::config::loader::load_config;
///
/// let config = load_config("mediquery.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<MediQueryConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PipelineError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PipelineError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: MediQueryConfig = toml::from_str(&contents)
        .map_err(|e| PipelineError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        PipelineError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. Every unset variable is reported at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| PipelineError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PipelineError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Applies environment variable overrides using MEDIQUERY_* prefix
///
/// Variables follow the pattern MEDIQUERY_<SECTION>_<KEY>, for example
/// MEDIQUERY_PIPELINE_BATCH_SIZE or MEDIQUERY_ELASTICSEARCH_NODE. Values that
/// fail to parse are ignored.
fn apply_env_overrides(config: &mut MediQueryConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("MEDIQUERY_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_parse("MEDIQUERY_APPLICATION_DRY_RUN") {
        config.application.dry_run = val;
    }

    // Source overrides
    if let Ok(val) = std::env::var("MEDIQUERY_SOURCES_MIMIC_PATH") {
        config.sources.mimic.path = val;
    }
    if let Some(val) = env_parse("MEDIQUERY_SOURCES_MIMIC_ENABLED") {
        config.sources.mimic.enabled = val;
    }
    if let Ok(val) = std::env::var("MEDIQUERY_SOURCES_SYNTHEA_PATH") {
        config.sources.synthea.path = val;
    }
    if let Some(val) = env_parse("MEDIQUERY_SOURCES_SYNTHEA_ENABLED") {
        config.sources.synthea.enabled = val;
    }

    // Pipeline overrides
    if let Some(val) = env_parse("MEDIQUERY_PIPELINE_BATCH_SIZE") {
        config.pipeline.batch_size = val;
    }
    if let Some(val) = env_parse("MEDIQUERY_PIPELINE_PROGRESS_INTERVAL") {
        config.pipeline.progress_interval = val;
    }
    if let Some(val) = env_parse("MEDIQUERY_PIPELINE_REFERENCE_DATE") {
        config.pipeline.reference_date = Some(val);
    }

    // Sink selection
    if let Ok(val) = std::env::var("MEDIQUERY_SINK_TARGET") {
        config.sink_target = match val.to_lowercase().as_str() {
            "elasticsearch" => SinkTarget::Elasticsearch,
            "ndjson" => SinkTarget::Ndjson,
            other => {
                return Err(PipelineError::Configuration(format!(
                    "Invalid MEDIQUERY_SINK_TARGET '{other}'. Must be one of: elasticsearch, ndjson"
                )))
            }
        };
    }

    // Elasticsearch overrides (only if Elasticsearch is configured)
    if let Some(ref mut es) = config.elasticsearch {
        if let Ok(val) = std::env::var("MEDIQUERY_ELASTICSEARCH_NODE") {
            es.node = val;
        }
        if let Ok(val) = std::env::var("MEDIQUERY_ELASTICSEARCH_API_KEY") {
            es.api_key = Some(secret_string(val));
        }
        if let Ok(val) = std::env::var("MEDIQUERY_ELASTICSEARCH_USERNAME") {
            es.username = Some(val);
        }
        if let Ok(val) = std::env::var("MEDIQUERY_ELASTICSEARCH_PASSWORD") {
            es.password = Some(secret_string(val));
        }
        if let Some(val) = env_parse("MEDIQUERY_ELASTICSEARCH_TLS_VERIFY") {
            es.tls_verify = val;
        }
        if let Some(val) = env_parse("MEDIQUERY_ELASTICSEARCH_MAX_RETRIES") {
            es.max_retries = val;
        }
    }

    if let Some(ref mut ndjson) = config.ndjson {
        if let Ok(val) = std::env::var("MEDIQUERY_NDJSON_OUTPUT_DIR") {
            ndjson.output_dir = val;
        }
    }

    if let Ok(val) = std::env::var("MEDIQUERY_TERMINOLOGY_TABLES_PATH") {
        config.terminology.tables_path = Some(val);
    }

    // Logging overrides
    if let Some(val) = env_parse("MEDIQUERY_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val;
    }
    if let Ok(val) = std::env::var("MEDIQUERY_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
