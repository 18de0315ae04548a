//! CSV source - opens the raw byte stream behind a locator
//!
//! `http://` and `https://` locators are streamed over HTTP; anything else is
//! a filesystem path. Locators ending in `.gz` are decompressed on the fly.

use crate::error::{IngestError, Result};
use async_compression::tokio::bufread::GzipDecoder;
use futures::TryStreamExt;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::io::StreamReader;
use tracing::{debug, info};

pub type SourceStream = Box<dyn AsyncRead + Unpin + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    File,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

/// Where the bytes come from and how they are encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocator {
    pub location: String,
    pub kind: SourceKind,
    pub compression: Compression,
}

impl SourceLocator {
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        let kind = if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceKind::Http
        } else {
            SourceKind::File
        };

        // Ignore any query string when looking at the extension
        let path_part = lower.split(['?', '#']).next().unwrap_or(&lower);
        let compression = if path_part.ends_with(".gz") {
            Compression::Gzip
        } else {
            Compression::None
        };

        Self {
            location: location.to_string(),
            kind,
            compression,
        }
    }
}

/// Open the locator as an async byte stream, front to back, exactly once.
pub async fn open_source(locator: &SourceLocator) -> Result<SourceStream> {
    info!("Opening CSV source {} ({:?}, {:?})", locator.location, locator.kind, locator.compression);

    let raw: SourceStream = match locator.kind {
        SourceKind::Http => open_http(&locator.location).await?,
        SourceKind::File => {
            let file = tokio::fs::File::open(&locator.location).await.map_err(|e| {
                IngestError::SourceRead(format!("cannot open {}: {}", locator.location, e))
            })?;
            Box::new(file)
        }
    };

    Ok(match locator.compression {
        Compression::None => raw,
        Compression::Gzip => {
            let mut decoder = GzipDecoder::new(BufReader::new(raw));
            decoder.multiple_members(true);
            Box::new(decoder)
        }
    })
}

async fn open_http(url: &str) -> Result<SourceStream> {
    let response = reqwest::get(url).await?.error_for_status()?;
    debug!("HTTP {} for {} (content-length: {:?})", response.status(), url, response.content_length());

    let stream = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

    Ok(Box::new(StreamReader::new(stream)))
}
