//! Data returned by adapters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One hit from a catalogue search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    /// Display title.
    pub title: String,
    /// Author, when the site lists one.
    #[serde(default)]
    pub author: Option<String>,
    /// Cover image URL.
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Identifier to pass back to [`Adapter::fetch_manga_info`](super::Adapter::fetch_manga_info).
    /// Its format is private to the adapter.
    #[serde(alias = "id")]
    pub opaque_id: String,
}

/// A chapter as listed on the manga's page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterInfo {
    /// Display name.
    pub name: String,
    /// Identifier to pass to
    /// [`Adapter::fetch_chapter_images`](super::Adapter::fetch_chapter_images).
    #[serde(alias = "id")]
    pub native_id: String,
    /// Chapter language.
    #[serde(default = "default_language")]
    pub language: String,
    /// Release date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Everything an adapter knows about one manga.
///
/// `chapters` is in reading order; chapter index `n` refers to
/// `chapters[n]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaMetadata {
    /// Adapter-specific identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Author.
    #[serde(default)]
    pub author: Option<String>,
    /// Cover image URL.
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Synopsis.
    #[serde(default)]
    pub description: Option<String>,
    /// Genre labels.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Chapters in reading order.
    #[serde(default)]
    pub chapters: Vec<ChapterInfo>,
    /// Number of chapters the site reports. Zero means "use `chapters.len()`".
    #[serde(default)]
    pub chapter_count: usize,
    /// Whether the series is still publishing.
    #[serde(default)]
    pub ongoing: bool,
}

impl MangaMetadata {
    /// Creates metadata with `chapter_count` taken from `chapters`.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, chapters: Vec<ChapterInfo>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            cover_image: None,
            description: None,
            genres: Vec::new(),
            chapter_count: chapters.len(),
            chapters,
            ongoing: false,
        }
    }

    /// Fills in `chapter_count` when the source left it at zero.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.chapter_count == 0 {
            self.chapter_count = self.chapters.len();
        }
        self
    }

    /// Returns the chapter at `index` if it is in range and listed.
    #[must_use]
    pub fn chapter(&self, index: u32) -> Option<&ChapterInfo> {
        let index = usize::try_from(index).ok()?;
        if index >= self.chapter_count {
            return None;
        }
        self.chapters.get(index)
    }
}

/// One page image of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// One-based page number.
    pub page: u32,
    /// Absolute image URL.
    pub url: String,
}

impl ImageRef {
    /// Creates a page reference.
    #[must_use]
    pub fn new(page: u32, url: impl Into<String>) -> Self {
        Self {
            page,
            url: url.into(),
        }
    }
}
