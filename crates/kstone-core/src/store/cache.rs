// ── Run-scoped entity cache ──
//
// Remembers every lookup made during one reconciliation run, including
// lookups that found nothing, so that the CLI is asked at most once per
// key. Nothing survives `reset()`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{EntityKey, EntityRecord};

/// Outcome of a previous lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    Found(Arc<EntityRecord>),
    /// The entity was looked up and does not exist.
    Missing,
}

impl CacheEntry {
    /// The cached record, if the entity was found.
    pub fn record(&self) -> Option<Arc<EntityRecord>> {
        match self {
            Self::Found(record) => Some(Arc::clone(record)),
            Self::Missing => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct EntityCache {
    entries: HashMap<EntityKey, CacheEntry>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means the key has not been looked up this run.
    pub fn get(&self, key: &EntityKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Cache a found record and return the shared handle.
    pub fn insert(&mut self, key: EntityKey, record: EntityRecord) -> Arc<EntityRecord> {
        let record = Arc::new(record);
        self.entries
            .insert(key, CacheEntry::Found(Arc::clone(&record)));
        record
    }

    /// Cache a negative result.
    pub fn insert_missing(&mut self, key: EntityKey) {
        self.entries.insert(key, CacheEntry::Missing);
    }

    /// Drop one entry. Returns whether anything was cached.
    pub fn invalidate(&mut self, key: &EntityKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
