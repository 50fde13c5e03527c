//! Units of adapter or downloader work produced by expanding actions.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::action::{SearchParams, Ticket};
use crate::adapter::ImageRef;
use crate::queue::Priority;

/// Lane for search requests.
pub const SEARCH_PRIORITY: Priority = 0;

/// Lane for page downloads. Served before new chapter expansions so that a
/// started chapter finishes before the next one begins.
pub const DOWNLOAD_IMAGE_PRIORITY: Priority = 1;

/// Lane for chapter expansions.
pub const START_CHAPTER_DOWNLOAD_PRIORITY: Priority = 2;

/// Discriminant of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// See [`SearchRequest`].
    Search,
    /// See [`ChapterDownloadRequest`].
    StartChapterDownload,
    /// See [`ImageDownloadRequest`].
    DownloadImage,
}

impl RequestKind {
    /// Returns the fixed lane for requests of this kind.
    #[must_use]
    pub fn priority(self) -> Priority {
        match self {
            Self::Search => SEARCH_PRIORITY,
            Self::StartChapterDownload => START_CHAPTER_DOWNLOAD_PRIORITY,
            Self::DownloadImage => DOWNLOAD_IMAGE_PRIORITY,
        }
    }

    /// Returns the snake-case name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::StartChapterDownload => "start_chapter_download",
            Self::DownloadImage => "download_image",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run a catalogue search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Originating action.
    pub ticket: Ticket,
    /// Full parameter set of the action.
    pub params: SearchParams,
}

/// Resolve a chapter to its page images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDownloadRequest {
    /// Originating action.
    pub ticket: Ticket,
    /// Adapter-specific manga identifier.
    pub manga_id: String,
    /// Zero-based chapter index.
    pub chapter: u32,
    /// Download root override.
    pub download_dir: Option<PathBuf>,
}

/// Save one page image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDownloadRequest {
    /// Originating action.
    pub ticket: Ticket,
    /// Page to fetch.
    pub image: ImageRef,
    /// Manga the page belongs to.
    pub manga_id: String,
    /// Zero-based chapter index.
    pub chapter: u32,
    /// Download root the page is saved under.
    pub download_dir: PathBuf,
}

/// A unit of work for the pipeline's request queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum Request {
    /// Catalogue search.
    Search(SearchRequest),
    /// Chapter expansion into page downloads.
    StartChapterDownload(ChapterDownloadRequest),
    /// Single page download.
    DownloadImage(ImageDownloadRequest),
}

impl Request {
    /// Returns the discriminant.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Search(_) => RequestKind::Search,
            Self::StartChapterDownload(_) => RequestKind::StartChapterDownload,
            Self::DownloadImage(_) => RequestKind::DownloadImage,
        }
    }

    /// Returns the lane this request is queued in.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.kind().priority()
    }

    /// Returns the ticket of the originating action.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Search(r) => r.ticket,
            Self::StartChapterDownload(r) => r.ticket,
            Self::DownloadImage(r) => r.ticket,
        }
    }
}
