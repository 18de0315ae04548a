use anyhow::{Context, Result};
use clap::Parser;
use csv_pg_ingest::{ingest, IngestArgs, IngestionConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Timing lines own stdout; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = IngestArgs::parse();
    let config = IngestionConfig::try_from(args).context("Invalid configuration")?;

    info!("CSV ingestion starting...");
    info!("Config: {:?}", config);

    match ingest(&config).await {
        Ok(result) => {
            info!(
                "Ingested {} rows in {} batches into {} ({:.3} s)",
                result.rows_ingested,
                result.batches,
                result.table_name,
                result.elapsed.as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            error!("Ingestion failed: {}", e);
            Err(e).with_context(|| format!("Failed to ingest {} into {}", config.url, config.table_name))
        }
    }
}
