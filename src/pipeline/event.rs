//! Results a pipeline reports to its driver.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::action::Ticket;
use crate::adapter::SearchSummary;
use crate::request::RequestKind;

/// Sending half of a pipeline's result channel.
pub type EventSender = mpsc::UnboundedSender<PipelineEvent>;

/// Receiving half of a pipeline's result channel.
pub type EventReceiver = mpsc::UnboundedReceiver<PipelineEvent>;

/// Creates a result channel.
#[must_use]
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Something a pipeline finished, or failed to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A search returned.
    SearchCompleted {
        /// Originating action.
        ticket: Ticket,
        /// Adapter that ran the search.
        adapter: String,
        /// Hits, in the adapter's order.
        results: Vec<SearchSummary>,
    },
    /// A chapter was resolved and its pages queued.
    ChapterQueued {
        /// Originating action.
        ticket: Ticket,
        /// Adapter identifier.
        adapter: String,
        /// Manga being downloaded.
        manga_id: String,
        /// Zero-based chapter index.
        chapter: u32,
        /// Page downloads queued.
        pages: usize,
    },
    /// One page was written to disk.
    PageSaved {
        /// Originating action.
        ticket: Ticket,
        /// Adapter identifier.
        adapter: String,
        /// Manga being downloaded.
        manga_id: String,
        /// Zero-based chapter index.
        chapter: u32,
        /// One-based page number.
        page: u32,
        /// Where the page was saved.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// A request failed or was dropped; the pipeline carries on.
    RequestFailed {
        /// Originating action.
        ticket: Ticket,
        /// Adapter identifier.
        adapter: String,
        /// Kind of request that failed.
        request: RequestKind,
        /// Rendered error.
        error: String,
    },
    /// The pipeline stopped and will not process further work.
    PipelineHalted {
        /// Adapter identifier.
        adapter: String,
        /// Rendered error that caused the halt.
        reason: String,
    },
}

impl PipelineEvent {
    /// Returns the originating ticket, if the event belongs to one action.
    #[must_use]
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Self::SearchCompleted { ticket, .. }
            | Self::ChapterQueued { ticket, .. }
            | Self::PageSaved { ticket, .. }
            | Self::RequestFailed { ticket, .. } => Some(*ticket),
            Self::PipelineHalted { .. } => None,
        }
    }

    /// Returns the adapter that produced the event.
    #[must_use]
    pub fn adapter(&self) -> &str {
        match self {
            Self::SearchCompleted { adapter, .. }
            | Self::ChapterQueued { adapter, .. }
            | Self::PageSaved { adapter, .. }
            | Self::RequestFailed { adapter, .. }
            | Self::PipelineHalted { adapter, .. } => adapter,
        }
    }
}
