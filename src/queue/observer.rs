//! Observer registration for queue mutations.

use super::{EntryId, Priority};

/// A mutation reported to registered observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    /// An entry was appended to a lane.
    Added {
        /// Entry that was added.
        id: EntryId,
        /// Lane it was added to.
        priority: Priority,
    },
    /// An entry was cancelled and taken out via `remove`.
    Removed {
        /// Entry that was removed.
        id: EntryId,
        /// Lane it was removed from.
        priority: Priority,
    },
    /// A whole lane was cancelled and emptied.
    LaneCleared {
        /// Lane that was cleared.
        priority: Priority,
        /// Number of entries it held.
        count: usize,
    },
}

/// Receives [`QueueEvent`]s from the queue it was subscribed to.
///
/// Callbacks run synchronously inside the mutating call and must not block.
pub trait QueueObserver: Send + Sync {
    /// Called after each mutation.
    fn on_event(&self, event: QueueEvent);
}

impl<F> QueueObserver for F
where
    F: Fn(QueueEvent) + Send + Sync,
{
    fn on_event(&self, event: QueueEvent) {
        self(event);
    }
}
