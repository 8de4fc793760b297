//! Document sink factory

use crate::adapters::elasticsearch::ElasticsearchSink;
use crate::adapters::ndjson::NdjsonSink;
use crate::adapters::sink::traits::DocumentSink;
use crate::config::schema::{MediQueryConfig, SinkTarget};
use crate::domain::{PipelineError, Result};
use std::sync::Arc;

/// Create the document sink selected by `sink_target`
///
/// # Errors
///
/// Returns a configuration error if the section for the selected sink is
/// missing, or if the HTTP client cannot be built.
pub fn create_sink(config: &MediQueryConfig) -> Result<Arc<dyn DocumentSink>> {
    match config.sink_target {
        SinkTarget::Elasticsearch => {
            let es_config = config.elasticsearch.as_ref().ok_or_else(|| {
                PipelineError::Configuration(
                    "elasticsearch configuration is required when sink_target = 'elasticsearch'"
                        .to_string(),
                )
            })?;

            tracing::info!(node = %es_config.node, "Creating Elasticsearch sink");
            let sink = ElasticsearchSink::new(es_config.clone())?;
            Ok(Arc::new(sink) as Arc<dyn DocumentSink>)
        }
        SinkTarget::Ndjson => {
            let ndjson_config = config.ndjson.as_ref().ok_or_else(|| {
                PipelineError::Configuration(
                    "ndjson configuration is required when sink_target = 'ndjson'".to_string(),
                )
            })?;

            tracing::info!(output_dir = %ndjson_config.output_dir, "Creating NDJSON sink");
            Ok(Arc::new(NdjsonSink::new(&ndjson_config.output_dir)) as Arc<dyn DocumentSink>)
        }
    }
}
