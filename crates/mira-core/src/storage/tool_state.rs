//! Typed tool state storage wrapper.

use super::decode;
use crate::models::{CoOccurrence, ToolState};
use anyhow::Result;
use redb::Database;
use std::sync::Arc;

/// Typed tool state storage wrapper around mira_storage::ToolStateStorage.
#[derive(Clone)]
pub struct ToolStateStorage {
    inner: mira_storage::ToolStateStorage,
}

impl ToolStateStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: mira_storage::ToolStateStorage::new(db)?,
        })
    }

    pub fn save(&self, state: &ToolState) -> Result<()> {
        let json_bytes = serde_json::to_vec(state)?;
        self.inner
            .put_state_raw(&state.owner, &state.tool_name, &json_bytes)
    }

    pub fn get(&self, owner: &str, tool: &str) -> Result<Option<ToolState>> {
        Ok(self
            .inner
            .get_state_raw(owner, tool)?
            .and_then(|bytes| decode("tool_state", tool, &bytes)))
    }

    pub fn list_for_owner(&self, owner: &str) -> Result<Vec<ToolState>> {
        Ok(self
            .inner
            .list_states_for_owner_raw(owner)?
            .into_iter()
            .filter_map(|bytes| decode("tool_state", owner, &bytes))
            .collect())
    }

    pub fn list_all(&self) -> Result<Vec<ToolState>> {
        Ok(self
            .inner
            .list_states_raw()?
            .into_iter()
            .filter_map(|bytes| decode("tool_state", "*", &bytes))
            .collect())
    }

    /// Bump the counter for an unordered tool pair, returning the new count.
    pub fn increment_cooccurrence(&self, owner: &str, tool_a: &str, tool_b: &str) -> Result<u64> {
        self.inner.increment_cooccurrence(owner, tool_a, tool_b)
    }

    /// Pairs involving `tool`, highest count first.
    pub fn cooccurrences_for(&self, owner: &str, tool: &str) -> Result<Vec<CoOccurrence>> {
        let mut pairs: Vec<CoOccurrence> = self
            .inner
            .list_cooccurrence_for(owner, tool)?
            .into_iter()
            .map(|(other, count)| CoOccurrence {
                tool_a: tool.to_string(),
                tool_b: other,
                owner: owner.to_string(),
                count,
            })
            .collect();
        pairs.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tool_b.cmp(&b.tool_b)));
        Ok(pairs)
    }
}
