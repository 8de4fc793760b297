//! Core ingest logic for MediQuery.
//!
//! # Modules
//!
//! - [`source`] - CSV extract reading and child-table indexes
//! - [`enrich`] - Clinical classification and derived scores
//! - [`assemble`] - Per-dialect document assembly
//! - [`pipeline`] - Run coordination, batching and statistics
//!
//! Data flows one way: source rows are joined with their child rows,
//! enriched, assembled into documents and written to the sink in batches.

pub mod assemble;
pub mod enrich;
pub mod pipeline;
pub mod source;
