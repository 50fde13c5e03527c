//! In-memory, multi-lane priority queue with cancellation.
//!
//! Every pipeline owns two of these: one for actions and one for requests.
//! Entries are grouped into lanes by an integer priority; lanes are served in
//! ascending numeric order and each lane is strictly FIFO.
//!
//! # Overview
//!
//! - [`PriorityLaneQueue`] - The queue itself
//! - [`QueueItem`] - Wrapper holding the value, its lane and cancellation flag
//! - [`CancelFlag`] - Shared flag that lets a caller cancel a resident entry
//! - [`QueueObserver`] / [`QueueEvent`] - Explicit mutation notifications
//! - [`QueueError`] - Capacity and lookup errors
//!
//! # Example
//!
//! ```
//! use manga_pipeline::queue::PriorityLaneQueue;
//!
//! let mut queue = PriorityLaneQueue::with_capacity(16);
//! queue.add("download page", 1).unwrap();
//! queue.add("search", 0).unwrap();
//!
//! assert_eq!(queue.pop().map(|item| *item.value()), Some("search"));
//! assert_eq!(queue.len(), 1);
//! ```

mod error;
mod item;
mod observer;

pub use error::QueueError;
pub use item::{CancelFlag, EntryId, Priority, QueueItem};
pub use observer::{QueueEvent, QueueObserver};

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

/// Default number of entries a queue accepts before rejecting additions.
pub const DEFAULT_QUEUE_CAPACITY: usize = 2000;

/// An ordered, multi-lane, cancelable queue.
///
/// Capacity bounds memory for a single misbehaving source; it is not flow
/// control. Additions past capacity leave the queue untouched and return
/// [`QueueError::Full`].
pub struct PriorityLaneQueue<T> {
    lanes: BTreeMap<Priority, VecDeque<QueueItem<T>>>,
    size: usize,
    capacity: usize,
    next_id: u64,
    observers: Vec<Arc<dyn QueueObserver>>,
}

impl<T> PriorityLaneQueue<T> {
    /// Creates an empty queue with [`DEFAULT_QUEUE_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates an empty queue that holds at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lanes: BTreeMap::new(),
            size: 0,
            capacity,
            next_id: 0,
            observers: Vec::new(),
        }
    }

    /// Registers an observer for subsequent mutations.
    pub fn subscribe(&mut self, observer: Arc<dyn QueueObserver>) {
        self.observers.push(observer);
    }

    fn notify(&self, event: QueueEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    /// Appends `value` to the tail of the lane for `priority`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] if the queue already holds `capacity`
    /// entries. Nothing is inserted and observers are not notified.
    pub fn add(&mut self, value: T, priority: Priority) -> Result<EntryId, QueueError> {
        if self.size + 1 > self.capacity {
            trace!(capacity = self.capacity, priority, "queue full, dropping entry");
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.lanes
            .entry(priority)
            .or_default()
            .push_back(QueueItem::new(id, priority, value));
        self.size += 1;

        self.notify(QueueEvent::Added { id, priority });
        Ok(id)
    }

    /// Cancels the entry with `id` and takes it out of its lane.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] if no resident entry has this id.
    pub fn remove(&mut self, id: EntryId) -> Result<QueueItem<T>, QueueError> {
        let located = self.lanes.iter().find_map(|(priority, lane)| {
            lane.iter()
                .position(|item| item.id() == id)
                .map(|index| (*priority, index))
        });
        let Some((priority, index)) = located else {
            return Err(QueueError::NotFound(id));
        };

        let item = self
            .lanes
            .get_mut(&priority)
            .and_then(|lane| lane.remove(index))
            .ok_or(QueueError::NotFound(id))?;
        self.prune_lane(priority);
        self.size -= 1;

        item.cancel();
        self.notify(QueueEvent::Removed { id, priority });
        Ok(item)
    }

    /// Removes and returns the head of the lowest-numbered non-empty lane.
    ///
    /// Cancelled entries are returned like any other; skipping them is the
    /// caller's decision.
    pub fn pop(&mut self) -> Option<QueueItem<T>> {
        let mut lane = self.lanes.first_entry()?;
        let item = lane.get_mut().pop_front();
        if lane.get().is_empty() {
            lane.remove();
        }
        if item.is_some() {
            self.size -= 1;
        }
        item
    }

    /// Returns the entry [`pop`](Self::pop) would return, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&QueueItem<T>> {
        self.lanes.values().find_map(VecDeque::front)
    }

    /// Returns the entry at position `index` in priority-then-arrival order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&QueueItem<T>> {
        if index >= self.size {
            return None;
        }
        let mut remaining = index;
        for lane in self.lanes.values() {
            if remaining < lane.len() {
                return lane.get(remaining);
            }
            remaining -= lane.len();
        }
        None
    }

    /// Returns the resident entry with `id`, if any.
    #[must_use]
    pub fn find(&self, id: EntryId) -> Option<&QueueItem<T>> {
        self.iter().find(|item| item.id() == id)
    }

    /// Cancels and removes every entry in the lane for `priority`.
    ///
    /// Observers are notified once for the whole batch. Returns the number
    /// of entries removed; clearing an empty or unknown lane returns 0 and
    /// notifies nobody.
    pub fn clear_by_priority(&mut self, priority: Priority) -> usize {
        let Some(lane) = self.lanes.remove(&priority) else {
            return 0;
        };
        let count = lane.len();
        for item in &lane {
            item.cancel();
        }
        self.size -= count;

        self.notify(QueueEvent::LaneCleared { priority, count });
        count
    }

    /// Iterates resident entries in priority-then-arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem<T>> {
        self.lanes.values().flat_map(VecDeque::iter)
    }

    /// Returns the number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if no entries are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of entries in the lane for `priority`.
    #[must_use]
    pub fn lane_len(&self, priority: Priority) -> usize {
        self.lanes.get(&priority).map_or(0, VecDeque::len)
    }

    fn prune_lane(&mut self, priority: Priority) {
        if self.lanes.get(&priority).is_some_and(VecDeque::is_empty) {
            self.lanes.remove(&priority);
        }
    }
}

impl<T> Default for PriorityLaneQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PriorityLaneQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lanes: Vec<(Priority, usize)> = self
            .lanes
            .iter()
            .map(|(priority, lane)| (*priority, lane.len()))
            .collect();
        f.debug_struct("PriorityLaneQueue")
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .field("lanes", &lanes)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn drain(queue: &mut PriorityLaneQueue<&'static str>) -> Vec<&'static str> {
        std::iter::from_fn(|| queue.pop().map(QueueItem::into_value)).collect()
    }

    // ==================== Ordering ====================

    #[test]
    fn test_pop_serves_lower_priority_first_fifo_within_lane() {
        let mut queue = PriorityLaneQueue::new();
        queue.add("b1", 2).unwrap();
        queue.add("a1", 0).unwrap();
        queue.add("b2", 2).unwrap();
        queue.add("c1", 1).unwrap();
        queue.add("a2", 0).unwrap();

        assert_eq!(drain(&mut queue), vec!["a1", "a2", "c1", "b1", "b2"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_two_digit_priorities_order_numerically() {
        let mut queue = PriorityLaneQueue::new();
        queue.add("ten", 10).unwrap();
        queue.add("two", 2).unwrap();
        queue.add("hundred", 100).unwrap();

        assert_eq!(drain(&mut queue), vec!["two", "ten", "hundred"]);
    }

    #[test]
    fn test_pop_empty_returns_none() {
        let mut queue: PriorityLaneQueue<u8> = PriorityLaneQueue::new();
        assert!(queue.pop().is_none());
        assert!(queue.peek().is_none());
    }

    #[test]
    fn test_pop_returns_cancelled_items() {
        let mut queue = PriorityLaneQueue::new();
        queue.add("x", 0).unwrap();
        queue.peek().unwrap().cancel();

        let item = queue.pop().unwrap();
        assert!(item.is_cancelled());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_peek_matches_pop_without_removing() {
        let mut queue = PriorityLaneQueue::new();
        queue.add("later", 3).unwrap();
        queue.add("first", 1).unwrap();

        assert_eq!(*queue.peek().unwrap().value(), "first");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().into_value(), "first");
    }

    #[test]
    fn test_get_indexes_in_priority_then_arrival_order() {
        let mut queue = PriorityLaneQueue::new();
        queue.add("p2-a", 2).unwrap();
        queue.add("p0-a", 0).unwrap();
        queue.add("p2-b", 2).unwrap();
        queue.add("p0-b", 0).unwrap();

        let seen: Vec<_> = (0..4).map(|i| *queue.get(i).unwrap().value()).collect();
        assert_eq!(seen, vec!["p0-a", "p0-b", "p2-a", "p2-b"]);
        assert!(queue.get(4).is_none());
        assert_eq!(queue.len(), 4, "get must not mutate");
    }

    // ==================== Capacity ====================

    #[test]
    fn test_add_beyond_capacity_is_rejected_without_mutation() {
        let mut queue = PriorityLaneQueue::with_capacity(2);
        queue.add(1, 0).unwrap();
        queue.add(2, 1).unwrap();

        let err = queue.add(3, 0).unwrap_err();
        assert_eq!(err, QueueError::Full { capacity: 2 });
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.lane_len(0), 1);
    }

    #[test]
    fn test_capacity_frees_up_after_pop() {
        let mut queue = PriorityLaneQueue::with_capacity(1);
        queue.add('a', 0).unwrap();
        assert!(queue.add('b', 0).is_err());
        queue.pop();
        assert!(queue.add('b', 0).is_ok());
    }

    // ==================== Removal ====================

    #[test]
    fn test_remove_cancels_and_updates_size() {
        let mut queue = PriorityLaneQueue::new();
        let keep = queue.add("keep", 1).unwrap();
        let dropped = queue.add("drop", 1).unwrap();

        let removed = queue.remove(dropped).unwrap();
        assert!(removed.is_cancelled());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek().unwrap().id(), keep);
    }

    #[test]
    fn test_remove_missing_entry_is_noop_error() {
        let mut queue = PriorityLaneQueue::new();
        let id = queue.add("once", 0).unwrap();
        queue.pop();

        assert_eq!(queue.remove(id).unwrap_err(), QueueError::NotFound(id));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_by_priority_cancels_whole_lane() {
        let mut queue = PriorityLaneQueue::new();
        queue.add("a", 1).unwrap();
        queue.add("b", 1).unwrap();
        queue.add("c", 2).unwrap();
        let flags: Vec<CancelFlag> = queue
            .iter()
            .filter(|item| item.priority() == 1)
            .map(QueueItem::cancel_flag)
            .collect();

        assert_eq!(queue.clear_by_priority(1), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.lane_len(1), 0);
        assert!(flags.iter().all(CancelFlag::is_cancelled));
        assert_eq!(queue.clear_by_priority(1), 0);
    }

    // ==================== Observers ====================

    #[test]
    fn test_observers_receive_mutations() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut queue = PriorityLaneQueue::with_capacity(3);
        queue.subscribe(Arc::new(move |event: QueueEvent| sink.lock().unwrap().push(event)));

        let a = queue.add("a", 4).unwrap();
        let b = queue.add("b", 4).unwrap();
        queue.add("c", 5).unwrap();
        let _ = queue.add("d", 5);
        queue.remove(a).unwrap();
        queue.clear_by_priority(5);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 5, "rejected add must not notify");
        assert_eq!(events[0], QueueEvent::Added { id: a, priority: 4 });
        assert_eq!(events[1], QueueEvent::Added { id: b, priority: 4 });
        assert_eq!(events[3], QueueEvent::Removed { id: a, priority: 4 });
        assert_eq!(
            events[4],
            QueueEvent::LaneCleared {
                priority: 5,
                count: 1
            }
        );
    }

    #[test]
    fn test_size_tracks_adds_minus_removals() {
        let mut queue = PriorityLaneQueue::new();
        let ids: Vec<_> = (0..10u8).map(|n| queue.add(n, n % 3).unwrap()).collect();
        queue.remove(ids[4]).unwrap();
        queue.pop();
        queue.pop();

        assert_eq!(queue.len(), 7);
        assert_eq!(queue.iter().count(), 7);
    }
}
