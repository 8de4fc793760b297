//! Document sink abstraction layer
//!
//! The pipeline writes through [`DocumentSink`]; [`create_sink`] picks the
//! implementation configured by `sink_target`.

pub mod factory;
pub mod traits;

pub use factory::create_sink;
pub use traits::{BulkIndexFailure, BulkIndexResult, DocumentSink};
