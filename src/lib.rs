//! Chunked CSV → PostgreSQL ingestion.
//!
//! Reads a CSV source (HTTP URL or local path, optionally gzipped) in
//! fixed-size batches and appends each batch to a table, creating the table
//! from the first batch's column types when it does not exist.

pub mod config;
pub mod error;
pub mod ingestion;

// Database module for PostgreSQL
pub mod db;

pub use config::{IngestArgs, IngestionConfig, DEFAULT_CHUNK_SIZE, DEFAULT_CONNECT_TIMEOUT_SECS};
pub use error::{IngestError, Result};
pub use ingestion::{ingest, IngestionResult};
