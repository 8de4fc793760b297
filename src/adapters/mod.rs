//! External system integrations for MediQuery.
//!
//! - [`sink`] - Document sink trait and factory
//! - [`elasticsearch`] - Elasticsearch `_bulk` sink
//! - [`ndjson`] - Newline-delimited JSON file sink
//!
//! The pipeline only sees `Arc<dyn DocumentSink>`, so tests can substitute a
//! recording sink.

pub mod elasticsearch;
pub mod ndjson;
pub mod sink;
