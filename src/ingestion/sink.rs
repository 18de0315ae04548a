//! Batch Sink Trait - Abstract interface for batch destinations

use crate::error::Result;
use crate::ingestion::batch_reader::Batch;
use async_trait::async_trait;

/// Destination for appended batches.
///
/// Implementations:
/// - PgTableWriter: PostgreSQL table (created on first append)
/// - MemorySink: in-memory collector used by tests
#[async_trait]
pub trait BatchSink: Send {
    /// Append every row of `batch`, creating the destination if needed.
    /// Returns the number of rows written.
    async fn append(&mut self, batch: &Batch) -> Result<u64>;

    /// Human-readable destination name, used in log lines.
    fn destination(&self) -> &str;
}

/// Collects appended batches in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    name: String,
    pub batches: Vec<Batch>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: Vec::new(),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }
}

#[async_trait]
impl BatchSink for MemorySink {
    async fn append(&mut self, batch: &Batch) -> Result<u64> {
        self.batches.push(batch.clone());
        Ok(batch.len() as u64)
    }

    fn destination(&self) -> &str {
        &self.name
    }
}
