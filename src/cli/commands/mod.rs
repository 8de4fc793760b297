//! CLI command implementations

pub mod ingest;
pub mod init;
pub mod validate;
