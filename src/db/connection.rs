//! Database connection management using sqlx

use crate::config::IngestionConfig;
use crate::error::{IngestError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Open the single connection used for the whole run.
///
/// The pool is capped at one connection so every batch goes through the
/// same session, and the connection is verified before any batch is read.
pub async fn connect(config: &IngestionConfig) -> Result<PgPool> {
    info!(
        "Connecting to postgresql://{}@{}:{}/{}",
        config.user, config.host, config.port, config.db
    );

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(config.connect_options())
        .await
        .map_err(IngestError::Connection)?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(IngestError::Connection)?;

    Ok(pool)
}
