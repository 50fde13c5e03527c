//! Error types for pipeline operations.

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::download::DownloadError;
use crate::queue::QueueError;

/// Errors raised while submitting to or stepping a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A configuration value is out of range.
    #[error("invalid pipeline configuration: {field} {reason}")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// An action or request queue rejected an entry.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The adapter failed.
    #[error(transparent)]
    Fetch(#[from] AdapterError),

    /// Saving a page failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The requested chapter index does not exist for this manga.
    #[error(
        "chapter {chapter} is out of range for '{manga_id}' ({chapter_count} chapters)\n  Suggestion: Chapter indices start at 0"
    )]
    InvalidChapterIndex {
        /// Manga being downloaded.
        manga_id: String,
        /// Requested zero-based index.
        chapter: u32,
        /// Number of chapters the adapter reported.
        chapter_count: usize,
    },

    /// The pipeline stopped after a fatal adapter error.
    #[error("pipeline for '{adapter}' is halted: {reason}")]
    Halted {
        /// Adapter identifier.
        adapter: String,
        /// Error that halted it.
        reason: String,
    },
}

impl PipelineError {
    /// Returns true if the pipeline cannot make further progress after this
    /// error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Fetch(error) => error.is_fatal(),
            Self::Halted { .. } => true,
            _ => false,
        }
    }
}
