//! Ingest pipeline: coordinator, batching and run statistics
//!
//! ```rust,no_run
//! use mediquery::adapters::sink::create_sink;
//! use mediquery::config::load_config;
//! use mediquery::core::pipeline::PipelineCoordinator;
//! use mediquery::terminology::Terminology;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("mediquery.toml")?;
//! let terminology = Arc::new(Terminology::load(&config.terminology)?);
//! let sink = create_sink(&config)?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = PipelineCoordinator::new(config, terminology, sink, shutdown_rx);
//! match coordinator.run().await {
//!     Ok(stats) => println!("Indexed {} documents", stats.documents_indexed),
//!     Err(aborted) => eprintln!("Aborted after {} documents: {}", aborted.statistics.processed, aborted.cause),
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod coordinator;
pub mod stats;

pub use batch::{BatchResult, BatchSink};
pub use coordinator::PipelineCoordinator;
pub use stats::{RunAborted, RunStatistics};
