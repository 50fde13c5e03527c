//! Per-pipeline manga metadata cache.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::MangaMetadata;

/// Metadata fetched by one pipeline, keyed by the requested manga id.
///
/// Entries never expire on their own; callers drop stale ones with
/// [`invalidate`](Self::invalidate).
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: HashMap<String, Arc<MangaMetadata>>,
}

impl MetadataCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached metadata for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<MangaMetadata>> {
        self.entries.get(id).cloned()
    }

    /// Stores `metadata` under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, metadata: MangaMetadata) -> Arc<MangaMetadata> {
        let metadata = Arc::new(metadata);
        self.entries.insert(id.into(), Arc::clone(&metadata));
        metadata
    }

    /// Drops the entry for `id`. Returns true if one was present.
    pub fn invalidate(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_invalidate() {
        let mut cache = MetadataCache::new();
        assert!(cache.get("m").is_none());

        let stored = cache.insert("m", MangaMetadata::new("m", "Title", Vec::new()));
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&stored, &cache.get("m").unwrap()));

        assert!(cache.invalidate("m"));
        assert!(!cache.invalidate("m"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keyed_by_requested_id() {
        let mut cache = MetadataCache::new();
        cache.insert("short-id", MangaMetadata::new("canonical/long/id", "T", Vec::new()));
        assert!(cache.contains("short-id"));
        assert!(!cache.contains("canonical/long/id"));
    }
}
