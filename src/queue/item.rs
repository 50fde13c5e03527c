//! Queue entry wrapper, identifiers and cancellation flags.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lane priority. Lower numbers are served first.
pub type Priority = u8;

/// Identifier assigned to an entry when it is added to a queue.
///
/// Identifiers are unique within one queue and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl EntryId {
    /// Returns the raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a caller holding a clone can cancel an
/// entry that is still sitting in a queue without touching the queue itself.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the flag as cancelled. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A value resident in a [`PriorityLaneQueue`](super::PriorityLaneQueue).
#[derive(Debug)]
pub struct QueueItem<T> {
    id: EntryId,
    priority: Priority,
    cancel: CancelFlag,
    value: T,
}

impl<T> QueueItem<T> {
    pub(crate) fn new(id: EntryId, priority: Priority, value: T) -> Self {
        Self {
            id,
            priority,
            cancel: CancelFlag::new(),
            value,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Returns the lane this entry was added to.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns a handle to this entry's cancellation flag.
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Marks the entry cancelled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true if the entry has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Borrows the wrapped value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwraps the entry into its value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }
}
