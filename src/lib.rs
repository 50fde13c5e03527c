//! Manga Pipeline Library
//!
//! Drives pluggable manga site adapters through a prioritized, cancelable,
//! step-at-a-time job pipeline: searches, chapter resolution and page
//! downloads.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`queue`] - Multi-lane priority queue with cancellation and observers
//! - [`action`] - Validated user intents (search, download)
//! - [`request`] - Units of work actions expand into
//! - [`adapter`] - The site adapter trait and a JSON API adapter
//! - [`download`] - Page downloader and on-disk layout
//! - [`pipeline`] - Per-adapter step function and metadata cache
//! - [`scheduler`] - Multi-adapter driver

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod adapter;
pub mod download;
pub mod http;
pub mod pipeline;
pub mod queue;
pub mod request;
pub mod scheduler;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use action::{Action, ActionKind, DownloadAction, SearchAction, SearchParams, Ticket, ValidationError};
pub use adapter::{Adapter, AdapterError, AdapterInfo, HttpJsonAdapter, MangaMetadata};
pub use download::{DownloadError, Downloader, HttpDownloader};
pub use pipeline::{
    ExtensionPipeline, PipelineConfig, PipelineError, PipelineEvent, StepOutcome,
};
pub use queue::{PriorityLaneQueue, QueueError, QueueItem};
pub use request::{Request, RequestKind};
pub use scheduler::{RunSummary, Scheduler, SchedulerError};
