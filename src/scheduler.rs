//! Drives a set of pipelines, one per registered adapter.
//!
//! The scheduler fans searches out to every adapter, routes downloads to
//! the adapter that owns the manga, and advances all pipelines one step per
//! [`tick`](Scheduler::tick). Pipelines share no mutable state, so a tick
//! steps them concurrently.

use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::action::{DownloadAction, SearchAction, SearchParams, Ticket};
use crate::adapter::{Adapter, AdapterInfo};
use crate::download::Downloader;
use crate::pipeline::{
    ActionHandle, EventSender, ExtensionPipeline, PipelineConfig, PipelineError, StepOutcome,
};

/// Errors raised by scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// An adapter with this id is already registered.
    #[error("adapter '{id}' is already registered")]
    DuplicateAdapter {
        /// The conflicting id.
        id: String,
    },

    /// No adapter with this id is registered.
    #[error("unknown adapter '{id}'\n  Suggestion: Registered adapters: {known}")]
    UnknownAdapter {
        /// The requested id.
        id: String,
        /// Comma-separated registered ids.
        known: String,
    },

    /// There is nothing to submit work to.
    #[error("no adapters are available\n  Suggestion: Register an adapter before submitting work")]
    NoAdapters,

    /// A pipeline rejected the operation.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Outcome of one pipeline's step during a tick.
#[derive(Debug)]
pub struct TickReport {
    /// Adapter the pipeline is bound to.
    pub adapter: String,
    /// What the step did.
    pub outcome: StepOutcome,
}

/// Totals accumulated by [`Scheduler::run_until_idle`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks performed.
    pub ticks: usize,
    /// Actions expanded.
    pub expanded: usize,
    /// Requests completed.
    pub dispatched: usize,
    /// Requests failed.
    pub failed: usize,
    /// Cancelled actions discarded.
    pub discarded: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Expanded { discarded, .. } => {
                self.expanded += 1;
                self.discarded += discarded;
            }
            StepOutcome::Dispatched { .. } => self.dispatched += 1,
            StepOutcome::Failed { .. } => self.failed += 1,
            StepOutcome::Discarded { count } => self.discarded += count,
            StepOutcome::Idle | StepOutcome::Halted => {}
        }
    }
}

/// Owns one [`ExtensionPipeline`] per registered adapter.
pub struct Scheduler {
    pipelines: Vec<ExtensionPipeline>,
    downloader: Arc<dyn Downloader>,
    config: PipelineConfig,
    events: Option<EventSender>,
}

impl Scheduler {
    /// Creates a scheduler whose pipelines share `downloader` and `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Pipeline`] if `config` fails validation.
    pub fn new(downloader: Arc<dyn Downloader>, config: PipelineConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            pipelines: Vec::new(),
            downloader,
            config,
            events: None,
        })
    }

    /// Sends every pipeline's results to `sender`. Applies to adapters
    /// registered afterwards.
    #[must_use]
    pub fn with_event_sink(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Registers an adapter and creates its pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DuplicateAdapter`] if the id is taken.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) -> Result<(), SchedulerError> {
        let id = adapter.info().id().to_string();
        if self.pipeline(&id).is_some() {
            return Err(SchedulerError::DuplicateAdapter { id });
        }

        let mut pipeline =
            ExtensionPipeline::new(adapter, Arc::clone(&self.downloader), self.config.clone())?;
        if let Some(sender) = &self.events {
            pipeline = pipeline.with_event_sink(sender.clone());
        }
        self.pipelines.push(pipeline);
        info!(adapter = %id, "adapter registered");
        Ok(())
    }

    /// Removes an adapter and returns its pipeline, with any queued work.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownAdapter`] if no such adapter exists.
    pub fn unregister(&mut self, adapter_id: &str) -> Result<ExtensionPipeline, SchedulerError> {
        let index = self.index_of(adapter_id)?;
        info!(adapter = adapter_id, "adapter unregistered");
        Ok(self.pipelines.remove(index))
    }

    /// Metadata of every registered adapter, in registration order.
    pub fn adapters(&self) -> impl Iterator<Item = &AdapterInfo> {
        self.pipelines.iter().map(ExtensionPipeline::adapter_info)
    }

    /// Returns the pipeline for `adapter_id`.
    #[must_use]
    pub fn pipeline(&self, adapter_id: &str) -> Option<&ExtensionPipeline> {
        self.pipelines.iter().find(|p| p.adapter_id() == adapter_id)
    }

    /// Returns the pipeline for `adapter_id` mutably.
    pub fn pipeline_mut(&mut self, adapter_id: &str) -> Option<&mut ExtensionPipeline> {
        self.pipelines.iter_mut().find(|p| p.adapter_id() == adapter_id)
    }

    fn index_of(&self, adapter_id: &str) -> Result<usize, SchedulerError> {
        self.pipelines
            .iter()
            .position(|p| p.adapter_id() == adapter_id)
            .ok_or_else(|| SchedulerError::UnknownAdapter {
                id: adapter_id.to_string(),
                known: self
                    .pipelines
                    .iter()
                    .map(ExtensionPipeline::adapter_id)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Submits one search to every running pipeline under a shared ticket.
    ///
    /// Pipelines that reject the search (halted, queue full) are skipped
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoAdapters`] if no pipeline accepted it.
    pub fn search(&mut self, params: &SearchParams) -> Result<Ticket, SchedulerError> {
        let ids: Vec<String> = self
            .pipelines
            .iter()
            .map(|p| p.adapter_id().to_string())
            .collect();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.search_in(&ids, params)
    }

    /// Submits one search to the named adapters under a shared ticket.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownAdapter`] for an unregistered id, or
    /// [`SchedulerError::NoAdapters`] if no pipeline accepted the search.
    pub fn search_in(
        &mut self,
        adapter_ids: &[&str],
        params: &SearchParams,
    ) -> Result<Ticket, SchedulerError> {
        let indices = adapter_ids
            .iter()
            .map(|id| self.index_of(id))
            .collect::<Result<Vec<_>, _>>()?;

        let ticket = Ticket::next();
        let mut accepted = 0;
        for index in indices {
            let pipeline = &mut self.pipelines[index];
            match pipeline.submit_with_ticket(ticket, SearchAction::new(params.clone())) {
                Ok(_) => accepted += 1,
                Err(error) => {
                    warn!(adapter = %pipeline.adapter_id(), %ticket, error = %error, "search not submitted");
                }
            }
        }

        if accepted == 0 {
            return Err(SchedulerError::NoAdapters);
        }
        debug!(%ticket, adapters = accepted, "search submitted");
        Ok(ticket)
    }

    /// Submits a chapter download to the adapter that owns the manga.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownAdapter`] or the pipeline's
    /// submission error.
    pub fn download(
        &mut self,
        adapter_id: &str,
        action: DownloadAction,
    ) -> Result<ActionHandle, SchedulerError> {
        let index = self.index_of(adapter_id)?;
        Ok(self.pipelines[index].submit(action)?)
    }

    /// Steps every non-halted pipeline once, concurrently.
    pub async fn tick(&mut self) -> Vec<TickReport> {
        let steps = self
            .pipelines
            .iter_mut()
            .filter(|pipeline| !pipeline.is_halted())
            .map(|pipeline| async move {
                let adapter = pipeline.adapter_id().to_string();
                let outcome = pipeline.step().await;
                TickReport { adapter, outcome }
            });
        join_all(steps).await
    }

    /// Returns true if every pipeline is idle or halted.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pipelines
            .iter()
            .all(|pipeline| pipeline.is_halted() || pipeline.is_idle())
    }

    /// Ticks until [`is_idle`](Self::is_idle).
    pub async fn run_until_idle(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        while !self.is_idle() {
            for report in self.tick().await {
                summary.record(&report.outcome);
            }
            summary.ticks += 1;
        }
        info!(
            ticks = summary.ticks,
            dispatched = summary.dispatched,
            failed = summary.failed,
            "scheduler idle"
        );
        summary
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let adapters: Vec<&str> = self
            .pipelines
            .iter()
            .map(ExtensionPipeline::adapter_id)
            .collect();
        f.debug_struct("Scheduler")
            .field("adapters", &adapters)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
