//! Streaming HTTP page downloader.

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{DownloadError, Downloader};
use crate::http::{HttpTimeouts, build_client};

/// HTTP downloader that streams response bodies straight to disk.
///
/// Create once and share; the inner client pools connections.
///
/// # Example
///
/// ```no_run
/// use manga_pipeline::download::{Downloader, HttpDownloader};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = HttpDownloader::new();
/// let bytes = downloader
///     .download_file("https://cdn.example.com/1.jpg", Path::new("./out/1.jpg"))
///     .await?;
/// println!("saved {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDownloader {
    /// Creates a downloader with default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeouts(HttpTimeouts::default())
    }

    /// Creates a downloader with explicit timeouts.
    ///
    /// Falls back to a plain client if the configured one cannot be built.
    #[must_use]
    pub fn with_timeouts(timeouts: HttpTimeouts) -> Self {
        let client = build_client(timeouts).unwrap_or_else(|error| {
            warn!(error = %error, "HTTP client construction failed; using default client");
            Client::new()
        });
        Self { client }
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[instrument(skip(self, dest), fields(url = %url, dest = %dest.display()))]
    async fn download_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        debug!("starting download");
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self.fetch(url).await?;

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let stream_result = stream_to_file(&mut file, response, url, dest).await;
        if stream_result.is_err() {
            debug!(path = %dest.display(), "cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(dest).await;
        }
        let bytes = stream_result?;

        info!(path = %dest.display(), bytes, "page saved");
        Ok(bytes)
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
