//! Pipeline configuration.

use std::path::PathBuf;

use crate::queue::DEFAULT_QUEUE_CAPACITY;

use super::PipelineError;

/// Smallest accepted queue capacity.
pub const MIN_QUEUE_CAPACITY: usize = 1;
/// Largest accepted queue capacity.
pub const MAX_QUEUE_CAPACITY: usize = 1_000_000;

/// Settings shared by every pipeline a driver creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Capacity of both the action queue and the request queue.
    pub queue_capacity: usize,
    /// Root for saved pages when an action does not name one.
    pub download_root: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            download_root: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    /// Default settings saving under `download_root`.
    #[must_use]
    pub fn with_download_root(download_root: impl Into<PathBuf>) -> Self {
        Self {
            download_root: download_root.into(),
            ..Self::default()
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `queue_capacity` is
    /// outside `MIN_QUEUE_CAPACITY..=MAX_QUEUE_CAPACITY`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(MIN_QUEUE_CAPACITY..=MAX_QUEUE_CAPACITY).contains(&self.queue_capacity) {
            return Err(PipelineError::InvalidConfig {
                field: "queue_capacity",
                reason: format!(
                    "{} is outside {MIN_QUEUE_CAPACITY}..={MAX_QUEUE_CAPACITY}",
                    self.queue_capacity
                ),
            });
        }
        Ok(())
    }
}
