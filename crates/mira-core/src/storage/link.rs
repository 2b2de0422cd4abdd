//! Typed link storage wrapper.

use super::decode;
use crate::models::MemoryLink;
use anyhow::Result;
use redb::Database;
use std::sync::Arc;

/// Typed link storage wrapper around mira_storage::LinkStorage.
#[derive(Clone)]
pub struct LinkStorage {
    inner: mira_storage::LinkStorage,
}

impl LinkStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: mira_storage::LinkStorage::new(db)?,
        })
    }

    /// Insert or replace a link keyed by (source, target).
    pub fn upsert(&self, link: &MemoryLink) -> Result<()> {
        let json_bytes = serde_json::to_vec(link)?;
        self.inner
            .put_link_raw(&link.source, &link.target, &json_bytes)
    }

    pub fn get(&self, source: &str, target: &str) -> Result<Option<MemoryLink>> {
        Ok(self
            .inner
            .get_link_raw(source, target)?
            .and_then(|bytes| decode("link", &format!("{}:{}", source, target), &bytes)))
    }

    /// Links in either direction touching `memory_id`.
    pub fn list_for(&self, memory_id: &str) -> Result<Vec<MemoryLink>> {
        Ok(self
            .inner
            .list_links_touching_raw(memory_id)?
            .into_iter()
            .filter_map(|bytes| decode("link", memory_id, &bytes))
            .collect())
    }

    /// Cascade-delete all links touching `memory_id`.
    pub fn delete_for_memory(&self, memory_id: &str) -> Result<u32> {
        self.inner.delete_links_for_memory(memory_id)
    }

    pub fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}
