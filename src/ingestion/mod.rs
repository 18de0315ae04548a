//! Ingestion Module
//!
//! Streams a CSV source into a table in fixed-size batches:
//! - Source opening (HTTP or file, gzip-transparent)
//! - Per-batch typing, with configured date-time columns
//! - Sequential append through a `BatchSink`
//! - Per-batch timing report

pub mod batch_reader;
pub mod orchestrator;
pub mod schema_inference;
pub mod sink;
pub mod source;
pub mod value;

pub use batch_reader::{Batch, BatchReader};
pub use orchestrator::{format_timing_line, ingest, ingest_with_report, IngestionOrchestrator, IngestionResult};
pub use schema_inference::{BatchSchema, ColumnSpec, ColumnType, SchemaInference};
pub use sink::{BatchSink, MemorySink};
pub use source::{open_source, Compression, SourceKind, SourceLocator, SourceStream};
pub use value::CellValue;
