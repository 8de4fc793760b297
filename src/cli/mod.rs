//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for MediQuery using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// MediQuery - Clinical data ETL for MIMIC-III and Synthea
#[derive(Parser, Debug)]
#[command(name = "mediquery")]
#[command(version, about, long_about = None)]
#[command(author = "MediQuery Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mediquery.toml", env = "MEDIQUERY_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "MEDIQUERY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest CSV extracts into the configured sink
    Ingest(commands::ingest::IngestArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
