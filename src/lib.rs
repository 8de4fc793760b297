// MediQuery - Clinical data ETL for MIMIC-III and Synthea
// Copyright (c) 2025 MediQuery Contributors
// Licensed under the MIT License

//! # MediQuery - Clinical data ETL
//!
//! MediQuery reads MIMIC-III and Synthea CSV extracts, normalizes both into a
//! single patient-centric document shape, enriches each patient with clinical
//! classifications and risk scores, and bulk-loads the results into
//! Elasticsearch (or NDJSON files) for search.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Source reading, enrichment, assembly and the ingest pipeline
//! - [`adapters`] - Document sinks (Elasticsearch, NDJSON)
//! - [`terminology`] - Code crosswalks and classification tables
//! - [`domain`] - Core domain types, documents and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediquery::adapters::sink::create_sink;
//! use mediquery::config::load_config;
//! use mediquery::core::pipeline::PipelineCoordinator;
//! use mediquery::terminology::Terminology;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("mediquery.toml")?;
//!     let terminology = Arc::new(Terminology::load(&config.terminology)?);
//!     let sink = create_sink(&config)?;
//!     let (_tx, rx) = tokio::sync::watch::channel(false);
//!
//!     let stats = PipelineCoordinator::new(config, terminology, sink, rx).run().await?;
//!     println!("Indexed {} documents", stats.documents_indexed);
//!     Ok(())
//! }
//! ```
//!
//! ## Enrichment
//!
//! Diagnoses are classified into chronic conditions with a severity, patients
//! get a risk score and category, and each document carries a generated
//! narrative summary:
//!
//! ```rust,no_run
//! use mediquery::terminology::Terminology;
//!
//! let terminology = Terminology::builtin();
//! println!("{} crosswalk entries", terminology.crosswalk.len());
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`], an alias over
//! [`domain::PipelineError`]. Row-level problems are counted and logged; only
//! an unreachable sink or an I/O failure aborts a run.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod terminology;
