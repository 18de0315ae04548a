//! Table Writer - appends batches to a PostgreSQL table
//!
//! The table is created from the first batch's column types when it does not
//! exist yet; later batches are inserted into whatever schema the table has.
//! Each batch is written inside its own transaction, so a batch is either
//! fully appended or not at all. Earlier batches are never rolled back.

use crate::db::sql;
use crate::error::{IngestError, Result};
use crate::ingestion::batch_reader::Batch;
use crate::ingestion::schema_inference::BatchSchema;
use crate::ingestion::sink::BatchSink;
use crate::ingestion::value::CellValue;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::query_builder::Separated;
use sqlx::QueryBuilder;
use tracing::{debug, info};

pub struct PgTableWriter {
    pool: PgPool,
    table_name: String,
    table_ready: bool,
}

impl PgTableWriter {
    pub fn new(pool: PgPool, table_name: &str) -> Self {
        Self {
            pool,
            table_name: table_name.to_string(),
            table_ready: false,
        }
    }

    pub async fn table_exists(&self) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
            .bind(sql::quote_ident(&self.table_name))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| IngestError::write(&self.table_name, e))
    }

    /// Create the table (and its row-sequence index) if it is missing.
    async fn ensure_table(&mut self, schema: &BatchSchema) -> Result<()> {
        if self.table_exists().await? {
            info!("Appending to existing table {}", self.table_name);
        } else {
            let ddl = sql::create_table_sql(&self.table_name, schema);
            debug!("{}", ddl);
            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| IngestError::write(&self.table_name, e))?;
            sqlx::query(&sql::create_index_sql(&self.table_name))
                .execute(&self.pool)
                .await
                .map_err(|e| IngestError::write(&self.table_name, e))?;
            info!("Created table {} with {} columns", self.table_name, schema.len() + 1);
        }
        self.table_ready = true;
        Ok(())
    }
}

/// Bind one cell. Nulls are written as an untyped `NULL` literal so they
/// take the destination column's type.
fn push_cell<'args>(values: &mut Separated<'_, 'args, Postgres, &'static str>, cell: &'args CellValue) {
    match cell {
        CellValue::Null => {
            values.push("NULL");
        }
        CellValue::Bool(v) => {
            values.push_bind(*v);
        }
        CellValue::Int(v) => {
            values.push_bind(*v);
        }
        CellValue::Float(v) => {
            values.push_bind(*v);
        }
        CellValue::Text(v) => {
            values.push_bind(v.as_str());
        }
        CellValue::DateTime(v) => {
            values.push_bind(*v);
        }
    }
}

#[async_trait]
impl BatchSink for PgTableWriter {
    async fn append(&mut self, batch: &Batch) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        if !self.table_ready {
            self.ensure_table(&batch.schema).await?;
        }

        let table = self.table_name.as_str();
        let per_statement = sql::max_rows_per_statement(batch.schema.len());
        let prefix = sql::insert_prefix(table, &batch.schema);

        let mut tx = self.pool.begin().await.map_err(|e| IngestError::write(table, e))?;
        let mut position = batch.first_row;
        let mut written = 0u64;

        for rows in batch.rows.chunks(per_statement) {
            let offset = position;
            let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(prefix.as_str());
            query.push_values(rows.iter().enumerate(), |mut values, (i, row)| {
                values.push_bind((offset + i as u64) as i64);
                for cell in row {
                    push_cell(&mut values, cell);
                }
            });

            let result = query
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| IngestError::write(table, e))?;
            written += result.rows_affected();
            position += rows.len() as u64;
        }

        tx.commit().await.map_err(|e| IngestError::write(table, e))?;
        debug!("Committed {} rows into {}", written, table);
        Ok(written)
    }

    fn destination(&self) -> &str {
        &self.table_name
    }
}
