//! Site adapters: the boundary between the pipeline and a manga site.
//!
//! An [`Adapter`] knows how to search one site, describe a manga and list
//! the page images of a chapter. It never downloads pages itself; the
//! pipeline hands image URLs to a [`Downloader`](crate::download::Downloader).
//!
//! # Architecture
//!
//! - [`Adapter`] - Async trait every site implements
//! - [`AdapterInfo`] - Identity and descriptive metadata, validated on construction
//! - [`HttpJsonAdapter`] - Adapter for sites exposing a small JSON API
//! - [`SearchSummary`], [`MangaMetadata`], [`ChapterInfo`], [`ImageRef`] - Returned data

mod error;
mod info;
mod json_api;
mod models;

pub use error::{AdapterError, Capability};
pub use info::{
    AdapterInfo, AdapterTag, DEFAULT_AUTHOR, DEFAULT_DESCRIPTION, DEFAULT_LANGUAGE,
    DEFAULT_VERSION,
};
pub use json_api::HttpJsonAdapter;
pub use models::{ChapterInfo, ImageRef, MangaMetadata, SearchSummary};

use async_trait::async_trait;

use crate::action::SearchParams;

/// Capabilities a site must provide.
///
/// Every capability is a required method, so an adapter missing one does
/// not compile. Adapters that can only tell at runtime (e.g. a site whose
/// search endpoint is disabled) return [`AdapterError::NotImplemented`],
/// which halts the owning pipeline.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Identity of this adapter.
    fn info(&self) -> &AdapterInfo;

    /// Runs a catalogue search.
    ///
    /// # Errors
    ///
    /// Returns an [`AdapterError`] on any network, status or parse failure.
    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchSummary>, AdapterError>;

    /// Fetches metadata and the chapter list for one manga.
    ///
    /// # Errors
    ///
    /// Returns an [`AdapterError`] on any network, status or parse failure.
    async fn fetch_manga_info(&self, id: &str) -> Result<MangaMetadata, AdapterError>;

    /// Lists the page images of one chapter, ordered by page.
    ///
    /// # Errors
    ///
    /// Returns an [`AdapterError`] on any network, status or parse failure.
    async fn fetch_chapter_images(
        &self,
        native_chapter_id: &str,
    ) -> Result<Vec<ImageRef>, AdapterError>;
}
