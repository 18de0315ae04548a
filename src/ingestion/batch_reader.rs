//! Batch Reader - lazy, finite, non-restartable batches over a CSV stream
//!
//! The header is read (and validated against the configured date-time
//! columns) when the reader is opened. Each call to `next_batch` then pulls at
//! most `chunk_size` records, types them, and returns `None` once the source
//! is exhausted. A source whose row count is an exact multiple of the chunk
//! size never yields an empty trailing batch.

use crate::db::sql::INDEX_COLUMN;
use crate::error::{IngestError, Result};
use crate::ingestion::schema_inference::{BatchSchema, ColumnSpec, ColumnType, SchemaInference};
use crate::ingestion::value::CellValue;
use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use std::collections::HashSet;
use tokio::io::AsyncRead;
use tracing::debug;

/// One contiguous slice of source rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// 0-based sequence number of this batch
    pub index: usize,
    /// 0-based source position of the first row
    pub first_row: u64,
    pub schema: BatchSchema,
    pub rows: Vec<Vec<CellValue>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct BatchReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    reader: AsyncReader<R>,
    headers: Vec<String>,
    datetime_columns: Vec<bool>,
    chunk_size: usize,
    rows_read: u64,
    batches_read: usize,
    exhausted: bool,
}

/// Give blank header names a positional name (`Unnamed: 3`) and suffix
/// repeated names (`a`, `a.1`, `a.2`) so every column name is unique.
fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() { format!("Unnamed: {}", idx) } else { name };
        let mut candidate = base.clone();
        let mut k = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, k);
            k += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

impl<R> BatchReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Read the header row and check that every date-time column exists.
    pub async fn open(source: R, dt_cols: &[String], chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(IngestError::Config("chunk_size must be at least 1".to_string()));
        }

        let mut reader = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .buffer_capacity(1 << 20)
            .create_reader(source);

        let headers: Vec<String> = reader
            .headers()
            .await?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(IngestError::SourceRead("no columns to parse from CSV source".to_string()));
        }

        let headers = dedupe_headers(headers);
        if headers.iter().any(|h| h == INDEX_COLUMN) {
            return Err(IngestError::SourceRead(format!(
                "column '{}' in CSV header collides with the row-sequence column",
                INDEX_COLUMN
            )));
        }

        let missing: Vec<&str> = dt_cols
            .iter()
            .map(String::as_str)
            .filter(|c| !headers.iter().any(|h| h == c))
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::SourceRead(format!(
                "date-time column(s) not found in CSV header: {}",
                missing.join(", ")
            )));
        }

        let datetime_columns = headers
            .iter()
            .map(|h| dt_cols.iter().any(|c| c == h))
            .collect();

        debug!("CSV header has {} columns: {:?}", headers.len(), headers);

        Ok(Self {
            reader,
            headers,
            datetime_columns,
            chunk_size,
            rows_read: 0,
            batches_read: 0,
            exhausted: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Total data rows handed out so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Pull the next batch, or `None` at end of stream.
    pub async fn next_batch(&mut self) -> Result<Option<Batch>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut records = Vec::with_capacity(self.chunk_size.min(1 << 16));
        while records.len() < self.chunk_size {
            let mut record = StringRecord::new();
            if !self.reader.read_record(&mut record).await? {
                self.exhausted = true;
                break;
            }
            if record.len() > self.headers.len() {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(IngestError::SourceRead(format!(
                    "expected {} fields in line {}, saw {}",
                    self.headers.len(),
                    line,
                    record.len()
                )));
            }
            records.push(record);
        }

        if records.is_empty() {
            return Ok(None);
        }

        let batch = self.build_batch(&records)?;
        self.rows_read += batch.len() as u64;
        self.batches_read += 1;
        Ok(Some(batch))
    }

    fn build_batch(&self, records: &[StringRecord]) -> Result<Batch> {
        let columns = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let data_type = if self.datetime_columns[idx] {
                    ColumnType::Timestamp
                } else {
                    SchemaInference::infer_column_type(records.iter().map(|r| r.get(idx).unwrap_or("")))
                };
                ColumnSpec {
                    name: name.clone(),
                    data_type,
                }
            })
            .collect::<Vec<_>>();

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| match record.get(idx) {
                        Some(raw) => SchemaInference::coerce_cell(raw, column),
                        None => Ok(CellValue::Null),
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Batch {
            index: self.batches_read,
            first_row: self.rows_read,
            schema: BatchSchema { columns },
            rows,
        })
    }
}
