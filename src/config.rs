//! Ingestion configuration
//!
//! `IngestArgs` is the command-line surface (flag names follow the
//! `ingest_data` convention: `--table_name`, `--dt_cols`, ...). Every
//! connection flag falls back to the libpq environment variable of the same
//! meaning, so a `.env` file is enough to run against a local database.

use crate::error::{IngestError, Result};
use clap::Parser;
use sqlx::postgres::PgConnectOptions;
use std::fmt;
use std::time::Duration;

/// Rows per batch when `--chunk_size` is not given.
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// Seconds to keep retrying the initial connection.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug, Clone)]
#[command(name = "ingest_data")]
#[command(about = "Ingest CSV data to Postgres")]
pub struct IngestArgs {
    /// User name for Postgres
    #[arg(long, env = "PGUSER")]
    pub user: String,

    /// Password for Postgres
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub password: String,

    /// Host for Postgres
    #[arg(long, env = "PGHOST")]
    pub host: String,

    /// Port for Postgres
    #[arg(long, env = "PGPORT")]
    pub port: u16,

    /// Database for Postgres
    #[arg(long, env = "PGDATABASE")]
    pub db: String,

    /// Name of the table the data will be written to
    #[arg(long = "table_name")]
    pub table_name: String,

    /// URL (or local path) of the CSV file
    #[arg(long)]
    pub url: String,

    /// Comma-separated columns to parse as datetime
    #[arg(long = "dt_cols")]
    pub dt_cols: Option<String>,

    /// Rows per batch
    #[arg(long = "chunk_size", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Seconds to wait for the database before giving up
    #[arg(long = "connect_timeout", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,
}

/// Immutable run configuration, built once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct IngestionConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub db: String,
    pub table_name: String,
    pub url: String,
    pub dt_cols: Vec<String>,
    pub chunk_size: usize,
    pub connect_timeout: Duration,
}

impl IngestionConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.db)
    }

    fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(IngestError::Config("connect_timeout must be at least 1 second".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(IngestError::Config("chunk_size must be at least 1".to_string()));
        }
        if self.table_name.trim().is_empty() {
            return Err(IngestError::Config("table_name must not be empty".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(IngestError::Config("url must not be empty".to_string()));
        }
        Ok(())
    }
}

impl TryFrom<IngestArgs> for IngestionConfig {
    type Error = IngestError;

    fn try_from(args: IngestArgs) -> Result<Self> {
        let config = IngestionConfig {
            user: args.user,
            password: args.password,
            host: args.host,
            port: args.port,
            db: args.db,
            table_name: args.table_name,
            url: args.url,
            dt_cols: args.dt_cols.as_deref().map(parse_dt_cols).unwrap_or_default(),
            chunk_size: args.chunk_size,
            connect_timeout: Duration::from_secs(args.connect_timeout),
        };
        config.validate()?;
        Ok(config)
    }
}

impl fmt::Debug for IngestionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("table_name", &self.table_name)
            .field("url", &self.url)
            .field("dt_cols", &self.dt_cols)
            .field("chunk_size", &self.chunk_size)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Split a `--dt_cols` value into column names. Blank entries are dropped,
/// so `""` and `"a,,b"` behave as expected.
pub fn parse_dt_cols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
