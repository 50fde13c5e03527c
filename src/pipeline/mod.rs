//! Per-adapter job pipeline.
//!
//! An [`ExtensionPipeline`] owns two [`PriorityLaneQueue`]s, one for
//! submitted actions and one for the requests they expand into, plus a
//! metadata cache. It does nothing on its own: each call to
//! [`step`](ExtensionPipeline::step) performs exactly one unit of work and
//! returns. A driver (see [`Scheduler`](crate::scheduler::Scheduler)) decides
//! when to step.
//!
//! Requests are always drained before the next action is expanded, so an
//! action's fan-out finishes before the next action starts.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use manga_pipeline::action::DownloadAction;
//! use manga_pipeline::adapter::{AdapterInfo, HttpJsonAdapter};
//! use manga_pipeline::download::HttpDownloader;
//! use manga_pipeline::pipeline::{ExtensionPipeline, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let adapter = HttpJsonAdapter::new(AdapterInfo::new("site", "Site")?, "https://api.example.com")?;
//! let mut pipeline = ExtensionPipeline::new(
//!     Arc::new(adapter),
//!     Arc::new(HttpDownloader::new()),
//!     PipelineConfig::with_download_root("./manga"),
//! )?;
//! pipeline.submit(DownloadAction::new("berserk", 0))?;
//! while !pipeline.is_idle() {
//!     println!("{:?}", pipeline.step().await);
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;
mod error;
mod event;

pub use cache::MetadataCache;
pub use config::{MAX_QUEUE_CAPACITY, MIN_QUEUE_CAPACITY, PipelineConfig};
pub use error::PipelineError;
pub use event::{EventReceiver, EventSender, PipelineEvent, event_channel};

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::action::{Action, ActionKind, Ticket};
use crate::adapter::{Adapter, AdapterInfo, MangaMetadata};
use crate::download::{DownloadError, Downloader, chapter_dir, page_file_name};
use crate::queue::{CancelFlag, EntryId, Priority, PriorityLaneQueue, QueueItem, QueueObserver};
use crate::request::{
    ChapterDownloadRequest, ImageDownloadRequest, Request, RequestKind, SearchRequest,
};

/// Handle returned when an action is submitted.
#[derive(Debug, Clone)]
pub struct ActionHandle {
    ticket: Ticket,
    entry: EntryId,
    cancel: CancelFlag,
}

impl ActionHandle {
    /// Ticket correlating the action with its results.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Position of the action in the action queue.
    #[must_use]
    pub fn entry(&self) -> EntryId {
        self.entry
    }

    /// Cancels the action if it has not been expanded yet. Cancelling after
    /// expansion has no effect on requests already queued.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// What a single [`ExtensionPipeline::step`] did.
#[derive(Debug)]
pub enum StepOutcome {
    /// Both queues were empty.
    Idle,
    /// Only cancelled actions were found; they were discarded.
    Discarded {
        /// Actions discarded.
        count: usize,
    },
    /// An action was expanded into requests. Nothing was dispatched.
    Expanded {
        /// The action's ticket.
        ticket: Ticket,
        /// Kind of action expanded.
        action: ActionKind,
        /// Requests queued.
        requests: usize,
        /// Requests dropped because the request queue was full.
        dropped: usize,
        /// Cancelled actions discarded before this one.
        discarded: usize,
    },
    /// A request completed.
    Dispatched {
        /// Originating ticket.
        ticket: Ticket,
        /// Kind of request dispatched.
        request: RequestKind,
        /// Follow-up requests it queued.
        spawned: usize,
    },
    /// A request failed. The pipeline continues unless the error is fatal.
    Failed {
        /// Originating ticket.
        ticket: Ticket,
        /// Kind of request that failed.
        request: RequestKind,
        /// What went wrong.
        error: PipelineError,
    },
    /// The pipeline is halted and did nothing.
    Halted,
}

impl StepOutcome {
    /// Returns true if the step found nothing to do.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle | Self::Halted)
    }
}

struct PendingAction {
    ticket: Ticket,
    action: Action,
}

/// A job pipeline bound to one adapter.
pub struct ExtensionPipeline {
    adapter: Arc<dyn Adapter>,
    downloader: Arc<dyn Downloader>,
    config: PipelineConfig,
    actions: PriorityLaneQueue<PendingAction>,
    requests: PriorityLaneQueue<Request>,
    cache: MetadataCache,
    events: Option<EventSender>,
    halted: Option<String>,
}

impl ExtensionPipeline {
    /// Creates an idle pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        adapter: Arc<dyn Adapter>,
        downloader: Arc<dyn Downloader>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            adapter,
            downloader,
            actions: PriorityLaneQueue::with_capacity(config.queue_capacity),
            requests: PriorityLaneQueue::with_capacity(config.queue_capacity),
            config,
            cache: MetadataCache::new(),
            events: None,
            halted: None,
        })
    }

    /// Sends results to `sender`.
    #[must_use]
    pub fn with_event_sink(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Returns the adapter's metadata.
    #[must_use]
    pub fn adapter_info(&self) -> &AdapterInfo {
        self.adapter.info()
    }

    /// Returns the adapter's identifier.
    #[must_use]
    pub fn adapter_id(&self) -> &str {
        self.adapter.info().id()
    }

    /// Queues `action` under a freshly allocated ticket.
    ///
    /// # Errors
    ///
    /// See [`submit_with_ticket`](Self::submit_with_ticket).
    pub fn submit(&mut self, action: impl Into<Action>) -> Result<ActionHandle, PipelineError> {
        self.submit_with_ticket(Ticket::next(), action)
    }

    /// Queues `action` under an existing ticket, so one logical request can
    /// span several pipelines.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Halted`] if the pipeline has halted, or
    /// [`PipelineError::Queue`] if the action queue is full.
    pub fn submit_with_ticket(
        &mut self,
        ticket: Ticket,
        action: impl Into<Action>,
    ) -> Result<ActionHandle, PipelineError> {
        if let Some(reason) = &self.halted {
            return Err(PipelineError::Halted {
                adapter: self.adapter_id().to_string(),
                reason: reason.clone(),
            });
        }

        let action = action.into();
        let kind = action.kind();
        let priority = action.priority();
        let entry = self.actions.add(PendingAction { ticket, action }, priority)?;
        let cancel = self
            .actions
            .find(entry)
            .map(QueueItem::cancel_flag)
            .unwrap_or_default();

        debug!(adapter = %self.adapter_id(), %ticket, action = %kind, "action submitted");
        Ok(ActionHandle {
            ticket,
            entry,
            cancel,
        })
    }

    /// Removes a queued action before it is expanded.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Queue`] if the action is no longer queued.
    pub fn cancel(&mut self, entry: EntryId) -> Result<Ticket, PipelineError> {
        let item = self.actions.remove(entry)?;
        let ticket = item.value().ticket;
        debug!(adapter = %self.adapter_id(), %ticket, "action cancelled");
        Ok(ticket)
    }

    /// Performs one unit of work.
    ///
    /// If a request is queued, the highest-priority one is dispatched.
    /// Otherwise the next non-cancelled action is expanded into requests
    /// without dispatching any of them.
    #[instrument(skip(self), fields(adapter = %self.adapter_id()))]
    pub async fn step(&mut self) -> StepOutcome {
        if self.halted.is_some() {
            return StepOutcome::Halted;
        }

        while let Some(item) = self.requests.pop() {
            if item.is_cancelled() {
                debug!(entry = %item.id(), "skipping cancelled request");
                continue;
            }
            return self.dispatch(item.into_value()).await;
        }

        self.expand_next_action()
    }

    fn expand_next_action(&mut self) -> StepOutcome {
        let mut discarded = 0;
        while let Some(item) = self.actions.pop() {
            if item.is_cancelled() {
                discarded += 1;
                debug!(entry = %item.id(), "discarding cancelled action");
                continue;
            }

            let PendingAction { ticket, action } = item.into_value();
            let produced = action.to_requests(ticket);
            let total = produced.len();
            let mut accepted = 0;
            for request in produced {
                let kind = request.kind();
                match self.requests.add(request, kind.priority()) {
                    Ok(_) => accepted += 1,
                    Err(error) => {
                        self.report_failure(ticket, kind, &PipelineError::from(error));
                    }
                }
            }

            debug!(%ticket, action = %action.kind(), requests = accepted, "action expanded");
            return StepOutcome::Expanded {
                ticket,
                action: action.kind(),
                requests: accepted,
                dropped: total - accepted,
                discarded,
            };
        }

        if discarded > 0 {
            StepOutcome::Discarded { count: discarded }
        } else {
            StepOutcome::Idle
        }
    }

    async fn dispatch(&mut self, request: Request) -> StepOutcome {
        let ticket = request.ticket();
        let kind = request.kind();

        let result = match request {
            Request::Search(request) => self.run_search(request).await.map(|()| 0),
            Request::StartChapterDownload(request) => self.start_chapter(request).await,
            Request::DownloadImage(request) => self.save_page(request).await.map(|()| 0),
        };

        match result {
            Ok(spawned) => StepOutcome::Dispatched {
                ticket,
                request: kind,
                spawned,
            },
            Err(error) => {
                self.report_failure(ticket, kind, &error);
                if error.is_fatal() {
                    self.halt(&error);
                }
                StepOutcome::Failed {
                    ticket,
                    request: kind,
                    error,
                }
            }
        }
    }

    async fn run_search(&mut self, request: SearchRequest) -> Result<(), PipelineError> {
        let results = self.adapter.search(&request.params).await?;
        info!(ticket = %request.ticket, results = results.len(), "search completed");
        self.emit(PipelineEvent::SearchCompleted {
            ticket: request.ticket,
            adapter: self.adapter_id().to_string(),
            results,
        });
        Ok(())
    }

    async fn metadata(&mut self, manga_id: &str) -> Result<Arc<MangaMetadata>, PipelineError> {
        if let Some(cached) = self.cache.get(manga_id) {
            debug!(manga_id, "metadata cache hit");
            return Ok(cached);
        }
        let fetched = self.adapter.fetch_manga_info(manga_id).await?;
        Ok(self.cache.insert(manga_id, fetched))
    }

    async fn start_chapter(&mut self, request: ChapterDownloadRequest) -> Result<usize, PipelineError> {
        let ChapterDownloadRequest {
            ticket,
            manga_id,
            chapter,
            download_dir,
        } = request;

        let metadata = self.metadata(&manga_id).await?;
        let Some(info) = metadata.chapter(chapter) else {
            return Err(PipelineError::InvalidChapterIndex {
                manga_id,
                chapter,
                chapter_count: metadata.chapter_count,
            });
        };

        let images = self.adapter.fetch_chapter_images(&info.native_id).await?;
        let download_dir = download_dir.unwrap_or_else(|| self.config.download_root.clone());

        let mut queued = 0;
        for image in images {
            let page = Request::DownloadImage(ImageDownloadRequest {
                ticket,
                image,
                manga_id: manga_id.clone(),
                chapter,
                download_dir: download_dir.clone(),
            });
            match self.requests.add(page, RequestKind::DownloadImage.priority()) {
                Ok(_) => queued += 1,
                Err(error) => self.report_failure(
                    ticket,
                    RequestKind::DownloadImage,
                    &PipelineError::from(error),
                ),
            }
        }

        info!(%ticket, manga_id = %manga_id, chapter, pages = queued, "chapter queued");
        self.emit(PipelineEvent::ChapterQueued {
            ticket,
            adapter: self.adapter_id().to_string(),
            manga_id,
            chapter,
            pages: queued,
        });
        Ok(queued)
    }

    async fn save_page(&mut self, request: ImageDownloadRequest) -> Result<(), PipelineError> {
        let dir = chapter_dir(&request.download_dir, &request.manga_id, request.chapter);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DownloadError::io(&dir, e))?;
        let dest = dir.join(page_file_name(&request.image));

        let bytes = self
            .downloader
            .download_file(&request.image.url, &dest)
            .await?;

        self.emit(PipelineEvent::PageSaved {
            ticket: request.ticket,
            adapter: self.adapter_id().to_string(),
            manga_id: request.manga_id,
            chapter: request.chapter,
            page: request.image.page,
            path: dest,
            bytes,
        });
        Ok(())
    }

    fn report_failure(&self, ticket: Ticket, request: RequestKind, error: &PipelineError) {
        warn!(adapter = %self.adapter_id(), %ticket, %request, error = %error, "request failed");
        self.emit(PipelineEvent::RequestFailed {
            ticket,
            adapter: self.adapter_id().to_string(),
            request,
            error: error.to_string(),
        });
    }

    fn halt(&mut self, error: &PipelineError) {
        let reason = error.to_string();
        warn!(adapter = %self.adapter_id(), %reason, "pipeline halted");
        self.emit(PipelineEvent::PipelineHalted {
            adapter: self.adapter_id().to_string(),
            reason: reason.clone(),
        });
        self.halted = Some(reason);
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(sender) = &self.events
            && sender.send(event).is_err()
        {
            debug!("event receiver dropped");
        }
    }

    /// Returns true if both queues are empty.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.actions.is_empty() && self.requests.is_empty()
    }

    /// Returns true once a fatal adapter error has stopped the pipeline.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Number of queued actions, including cancelled ones not yet reached.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.actions.len()
    }

    /// Number of queued requests.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Queued requests in dispatch order.
    pub fn queued_requests(&self) -> impl Iterator<Item = &Request> {
        self.requests.iter().map(|item| item.value())
    }

    /// Cancels every queued request in lane `priority`. Returns how many.
    pub fn clear_requests_by_priority(&mut self, priority: Priority) -> usize {
        let count = self.requests.clear_by_priority(priority);
        if count > 0 {
            info!(adapter = %self.adapter_id(), priority, count, "request lane cleared");
        }
        count
    }

    /// Returns cached metadata for `manga_id`, without fetching.
    #[must_use]
    pub fn cached_metadata(&self, manga_id: &str) -> Option<Arc<MangaMetadata>> {
        self.cache.get(manga_id)
    }

    /// Drops cached metadata for `manga_id` so the next chapter download
    /// refetches it. Returns true if an entry was present.
    pub fn invalidate_metadata(&mut self, manga_id: &str) -> bool {
        self.cache.invalidate(manga_id)
    }

    /// Observes the action queue.
    pub fn subscribe_actions(&mut self, observer: Arc<dyn QueueObserver>) {
        self.actions.subscribe(observer);
    }

    /// Observes the request queue.
    pub fn subscribe_requests(&mut self, observer: Arc<dyn QueueObserver>) {
        self.requests.subscribe(observer);
    }
}

impl fmt::Debug for ExtensionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionPipeline")
            .field("adapter", &self.adapter_id())
            .field("config", &self.config)
            .field("actions", &self.actions)
            .field("requests", &self.requests)
            .field("cached", &self.cache.len())
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}
