//! Ingestion Orchestrator - the batch loop
//!
//! Pulls batches from a `BatchReader` one at a time, appends each to a
//! `BatchSink`, and reports how long every append took. Reading the next
//! batch never overlaps writing the current one.

use crate::config::IngestionConfig;
use crate::db::{connect, PgTableWriter};
use crate::error::{IngestError, Result};
use crate::ingestion::batch_reader::BatchReader;
use crate::ingestion::sink::BatchSink;
use crate::ingestion::source::{open_source, SourceLocator};
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Outcome of a completed run
#[derive(Clone, Debug, PartialEq)]
pub struct IngestionResult {
    pub run_id: String,
    pub table_name: String,
    pub batches: usize,
    pub rows_ingested: u64,
    pub elapsed: Duration,
}

/// The per-batch line written to the report stream.
pub fn format_timing_line(elapsed: Duration) -> String {
    format!("Check ... took {:.3} seconds", elapsed.as_secs_f64())
}

/// Ingestion Orchestrator - Coordinates reading and appending
pub struct IngestionOrchestrator<W: Write> {
    report: W,
}

impl<W: Write> IngestionOrchestrator<W> {
    pub fn new(report: W) -> Self {
        Self { report }
    }

    pub fn into_report(self) -> W {
        self.report
    }

    /// Drain `reader` into `sink`, one batch at a time.
    ///
    /// Any error aborts the run immediately; batches appended before the
    /// failure stay appended.
    pub async fn run<R, S>(&mut self, reader: &mut BatchReader<R>, sink: &mut S) -> Result<IngestionResult>
    where
        R: AsyncRead + Unpin + Send,
        S: BatchSink + ?Sized,
    {
        let run_id = Uuid::new_v4().to_string();
        let run_start = Instant::now();
        let mut batches = 0usize;
        let mut rows_ingested = 0u64;

        let span = info_span!("ingest", run_id = %run_id, destination = %sink.destination());
        info!(
            "Reading {} columns in batches of {} rows",
            reader.headers().len(),
            reader.chunk_size()
        );
        async {
            while let Some(batch) = reader.next_batch().await? {
                let start = Instant::now();
                let written = sink.append(&batch).await?;
                let elapsed = start.elapsed();

                writeln!(self.report, "{}", format_timing_line(elapsed)).map_err(IngestError::Report)?;
                self.report.flush().map_err(IngestError::Report)?;

                batches += 1;
                rows_ingested += written;
                info!(
                    batch = batch.index,
                    rows = written,
                    first_row = batch.first_row,
                    secs = elapsed.as_secs_f64(),
                    "Appended batch"
                );
            }
            Ok::<_, IngestError>(())
        }
        .instrument(span)
        .await?;

        let result = IngestionResult {
            run_id,
            table_name: sink.destination().to_string(),
            batches,
            rows_ingested,
            elapsed: run_start.elapsed(),
        };

        info!(
            run_id = %result.run_id,
            batches = result.batches,
            rows = result.rows_ingested,
            secs = result.elapsed.as_secs_f64(),
            "Ingestion finished"
        );

        Ok(result)
    }
}

/// Full pipeline for one configuration: connect, open the source, read the
/// header, then append every batch to the configured table. Timing lines go
/// to standard output.
pub async fn ingest(config: &IngestionConfig) -> Result<IngestionResult> {
    ingest_with_report(config, std::io::stdout()).await
}

/// `ingest`, writing timing lines to `report`.
pub async fn ingest_with_report<W: Write>(config: &IngestionConfig, report: W) -> Result<IngestionResult> {
    let pool = connect(config).await?;

    let locator = SourceLocator::parse(&config.url);
    let source = open_source(&locator).await?;
    let mut reader = BatchReader::open(source, &config.dt_cols, config.chunk_size).await?;

    let mut writer = PgTableWriter::new(pool.clone(), &config.table_name);
    let result = IngestionOrchestrator::new(report).run(&mut reader, &mut writer).await;

    pool.close().await;
    result
}
