//! Page downloading and on-disk layout.
//!
//! The pipeline never talks HTTP for images directly; it hands each image
//! URL and destination to a [`Downloader`]. [`HttpDownloader`] is the
//! streaming reqwest implementation used in production.

mod client;
mod error;
mod layout;

pub use client::HttpDownloader;
pub use error::DownloadError;
pub use layout::{
    FALLBACK_EXTENSION, chapter_dir, extension_from_url, page_destination, page_file_name,
    sanitize_path_segment,
};

use std::path::Path;

use async_trait::async_trait;

/// Saves remote files to disk.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetches `url` into `dest` and returns the number of bytes written.
    ///
    /// The parent directory of `dest` must already exist.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] on network, status or IO failure. No
    /// partially written file is left at `dest` on failure.
    async fn download_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}
