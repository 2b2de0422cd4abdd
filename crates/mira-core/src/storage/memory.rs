//! Typed memory storage wrapper.

use super::decode;
use crate::models::Memory;
use anyhow::Result;
use mira_storage::MemoryIndexKeys;
use redb::Database;
use std::sync::Arc;

fn index_keys(memory: &Memory) -> MemoryIndexKeys<'_> {
    MemoryIndexKeys::new(&memory.owner, memory.memory_type.as_str(), memory.strength)
}

/// Typed memory storage wrapper around mira_storage::MemoryStorage.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: mira_storage::MemoryStorage,
}

impl MemoryStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: mira_storage::MemoryStorage::new(db)?,
        })
    }

    /// Insert or update a memory, keeping its index entries in sync.
    pub fn save(&self, memory: &Memory) -> Result<()> {
        let previous = self.get(&memory.id)?;
        let json_bytes = serde_json::to_vec(memory)?;
        self.inner.put_memory_raw(
            &memory.id,
            &index_keys(memory),
            previous.as_ref().map(index_keys).as_ref(),
            &json_bytes,
        )
    }

    pub fn get(&self, memory_id: &str) -> Result<Option<Memory>> {
        Ok(self
            .inner
            .get_memory_raw(memory_id)?
            .and_then(|bytes| decode("memory", memory_id, &bytes)))
    }

    /// List every memory of one conversation.
    pub fn list_by_owner(&self, owner: &str) -> Result<Vec<Memory>> {
        Ok(self
            .inner
            .list_memories_by_owner_raw(owner)?
            .into_iter()
            .filter_map(|(id, bytes)| decode::<Memory>("memory", &id, &bytes))
            // Owner index keys are split on ':', so confirm the owner
            .filter(|memory| memory.owner == owner)
            .collect())
    }

    pub fn list_all(&self) -> Result<Vec<Memory>> {
        Ok(self
            .inner
            .list_all_raw()?
            .into_iter()
            .filter_map(|(id, bytes)| decode("memory", &id, &bytes))
            .collect())
    }

    /// IDs whose checkpointed strength is below `strength`.
    pub fn list_ids_below_strength(&self, strength: f64) -> Result<Vec<String>> {
        self.inner.list_ids_below_strength(strength)
    }

    /// Every owner that has at least one memory.
    pub fn list_owners(&self) -> Result<Vec<String>> {
        self.inner.list_owners()
    }

    /// Delete a memory and its index entries.
    pub fn delete(&self, memory_id: &str) -> Result<bool> {
        match self.get(memory_id)? {
            Some(memory) => self.inner.delete_memory(memory_id, &index_keys(&memory)),
            None => Ok(false),
        }
    }

    pub fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}
