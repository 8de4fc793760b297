//! Elasticsearch sink
//!
//! Documents are written with the `_bulk` API as `index` actions keyed by
//! document id, so re-running an ingest replaces documents instead of
//! duplicating them.
//!
//! ```rust,no_run
//! use mediquery::adapters::elasticsearch::ElasticsearchSink;
//! use mediquery::adapters::sink::DocumentSink;
//! use mediquery::config::ElasticsearchConfig;
//!
//! # async fn example() -> mediquery::domain::Result<()> {
//! let sink = ElasticsearchSink::new(ElasticsearchConfig::default())?;
//! sink.test_connection().await?;
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod client;

pub use client::ElasticsearchSink;
