//! Keyed per-conversation state with get-or-create semantics.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// A table of per-conversation values.
///
/// Each value sits behind its own lock, so work on one conversation never
/// holds the table shard while it runs.
pub struct SessionStore<T> {
    entries: DashMap<String, Arc<Mutex<T>>>,
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T> SessionStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for `key`, creating it with `init` when missing.
    ///
    /// Returns the entry and whether it was created by this call.
    pub fn get_or_create(&self, key: &str, init: impl FnOnce() -> T) -> (Arc<Mutex<T>>, bool) {
        if let Some(entry) = self.entries.get(key) {
            return (entry.clone(), false);
        }
        let mut created = false;
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(init()))
            })
            .clone();
        (entry, created)
    }

    pub fn get(&self, key: &str) -> Option<Arc<Mutex<T>>> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Mutex<T>>> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
