//! Error types for queue operations.

use thiserror::Error;

use super::EntryId;

/// Errors that can occur during queue operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue already holds `capacity` entries; the new entry was dropped.
    #[error(
        "queue is full ({capacity} entries)\n  Suggestion: Wait for the pipeline to drain or raise queue_capacity"
    )]
    Full {
        /// Configured capacity of the queue.
        capacity: usize,
    },

    /// No entry with this id is resident in the queue.
    #[error(
        "queue entry not found: {0}\n  Suggestion: The entry may already have been processed or removed"
    )]
    NotFound(EntryId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_error_full_message() {
        let msg = QueueError::Full { capacity: 3 }.to_string();
        assert!(msg.contains("full"));
        assert!(msg.contains('3'));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_queue_error_not_found_message() {
        let msg = QueueError::NotFound(EntryId(9)).to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("#9"));
    }
}
