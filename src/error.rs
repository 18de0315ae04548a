use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Source read error: {0}")]
    SourceRead(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot write timing report: {0}")]
    Report(#[source] std::io::Error),

    #[error("Write error on table {table}: {source}")]
    Write {
        table: String,
        #[source]
        source: sqlx::Error,
    },
}

impl IngestError {
    /// True for every failure that originates in the CSV source
    /// (unreachable, malformed, missing a configured date-time column).
    pub fn is_source_read(&self) -> bool {
        matches!(
            self,
            IngestError::SourceRead(_)
                | IngestError::Csv(_)
                | IngestError::Http(_)
                | IngestError::Io(_)
        )
    }

    pub fn write(table: &str, source: sqlx::Error) -> Self {
        IngestError::Write {
            table: table.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
