//! Elasticsearch HTTP client
//!
//! Talks to the cluster over its REST API: `GET /` for the connectivity
//! check and `POST /_bulk` for writes.

use super::bulk::{encode_bulk_body, parse_bulk_response, BulkResponse};
use crate::adapters::sink::{BulkIndexResult, DocumentSink};
use crate::config::ElasticsearchConfig;
use crate::domain::{PipelineError, Result, SinkDocument, SinkError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Subset of the `GET /` banner we log
#[derive(Debug, Deserialize)]
struct ClusterInfo {
    cluster_name: String,
    version: Option<ClusterVersion>,
}

#[derive(Debug, Deserialize)]
struct ClusterVersion {
    number: String,
}

/// Elasticsearch document sink
pub struct ElasticsearchSink {
    base_url: String,
    client: Client,
    config: ElasticsearchConfig,
}

impl ElasticsearchSink {
    /// Build a sink for the configured node
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let base_url = config.node.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)));

        if !config.tls_verify {
            tracing::warn!(node = %base_url, "TLS certificate verification is disabled");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            PipelineError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url,
            client,
            config,
        })
    }

    /// API key wins over basic auth when both are set
    fn auth_header_value(&self) -> Option<String> {
        if let Some(ref api_key) = self.config.api_key {
            Some(format!("ApiKey {}", api_key.expose_secret()))
        } else if let (Some(ref username), Some(ref password)) =
            (&self.config.username, &self.config.password)
        {
            let credentials = format!("{username}:{}", password.expose_secret());
            let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
            Some(format!("Basic {encoded}"))
        } else {
            None
        }
    }

    fn with_auth(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(auth) = self.auth_header_value() {
            request = request.header("Authorization", auth);
        }
        request
    }

    /// Delay before retry `attempt` (1-based), doubling up to `max_delay_ms`
    fn backoff_delay_ms(&self, attempt: usize) -> u64 {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let delay_ms = (self.config.initial_delay_ms as f64 * 2f64.powi(exponent)) as u64;
        delay_ms.min(self.config.max_delay_ms)
    }

    /// One `_bulk` request, without retries
    async fn post_bulk(&self, body: String) -> Result<BulkResponse> {
        let url = format!("{}/_bulk", self.base_url);
        let request = self
            .client
            .post(&url)
            .header("Content-Type", NDJSON_CONTENT_TYPE)
            .body(body);

        let resp = self
            .with_auth(request)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(SinkError::Throttled(format!("bulk request returned {status}")).into());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(
                SinkError::WriteFailed(format!("bulk request returned {status}: {body}")).into(),
            );
        }

        resp.json::<BulkResponse>()
            .await
            .map_err(|e| SinkError::InvalidResponse(format!("unreadable bulk response: {e}")).into())
    }

    /// `_bulk` with exponential backoff on throttling
    async fn post_bulk_with_retry(&self, body: String) -> Result<BulkResponse> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            match self.post_bulk(body.clone()).await {
                Err(PipelineError::Sink(SinkError::Throttled(reason))) if attempt < max_retries => {
                    attempt += 1;
                    let delay_ms = self.backoff_delay_ms(attempt);
                    crate::log_retry_attempt!(attempt, max_retries, reason);
                    tracing::debug!(delay_ms = delay_ms, "Backing off before bulk retry");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                other => return other,
            }
        }
    }
}

/// Only a failed connection means the cluster is gone; a slow request fails
/// its batch
fn request_error(e: reqwest::Error) -> PipelineError {
    if e.is_connect() {
        SinkError::Unreachable(e.to_string()).into()
    } else {
        SinkError::WriteFailed(e.to_string()).into()
    }
}

#[async_trait]
impl DocumentSink for ElasticsearchSink {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn test_connection(&self) -> Result<()> {
        let url = format!("{}/", self.base_url);
        let resp = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| SinkError::Unreachable(format!("{}: {e}", self.base_url)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SinkError::Unreachable(format!(
                "{} answered {status} to the connectivity check",
                self.base_url
            ))
            .into());
        }

        match resp.json::<ClusterInfo>().await {
            Ok(info) => tracing::info!(
                cluster_name = %info.cluster_name,
                version = %info.version.map(|v| v.number).unwrap_or_default(),
                "Connected to Elasticsearch"
            ),
            Err(e) => tracing::warn!(error = %e, "Connected to Elasticsearch, banner unreadable"),
        }

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

        let body = encode_bulk_body(index, &documents)?;
        let response = self.post_bulk_with_retry(body).await?;
        let result = parse_bulk_response(response, &documents)?;

        if result.failure_count > 0 {
            tracing::warn!(
                index = %index,
                failed = result.failure_count,
                succeeded = result.success_count,
                "Bulk request partially rejected"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn config() -> ElasticsearchConfig {
        ElasticsearchConfig {
            node: "http://localhost:9200/".to_string(),
            initial_delay_ms: 100,
            max_delay_ms: 1000,
            ..ElasticsearchConfig::default()
        }
    }

    #[test]
    fn test_base_url_trailing_slash_removed() {
        let sink = ElasticsearchSink::new(config()).unwrap();
        assert_eq!(sink.base_url, "http://localhost:9200");
    }

    #[test]
    fn test_backoff_is_capped() {
        let sink = ElasticsearchSink::new(config()).unwrap();
        assert_eq!(sink.backoff_delay_ms(1), 100);
        assert_eq!(sink.backoff_delay_ms(2), 200);
        assert_eq!(sink.backoff_delay_ms(4), 800);
        assert_eq!(sink.backoff_delay_ms(5), 1000);
        assert_eq!(sink.backoff_delay_ms(60), 1000);
    }

    #[test]
    fn test_api_key_auth_header() {
        let mut config = config();
        config.api_key = Some(secret_string("abc123".to_string()));
        config.username = Some("elastic".to_string());
        config.password = Some(secret_string("pw".to_string()));
        let sink = ElasticsearchSink::new(config).unwrap();
        assert_eq!(sink.auth_header_value().as_deref(), Some("ApiKey abc123"));
    }

    #[test]
    fn test_basic_auth_header() {
        let mut config = config();
        config.username = Some("elastic".to_string());
        config.password = Some(secret_string("changeme".to_string()));
        let sink = ElasticsearchSink::new(config).unwrap();
        // base64("elastic:changeme")
        assert_eq!(
            sink.auth_header_value().as_deref(),
            Some("Basic ZWxhc3RpYzpjaGFuZ2VtZQ==")
        );
    }

    #[test]
    fn test_no_auth_header() {
        let sink = ElasticsearchSink::new(config()).unwrap();
        assert!(sink.auth_header_value().is_none());
    }
}
