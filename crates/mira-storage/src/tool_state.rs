//! Tool activation storage - per-conversation tool state and pairwise usage counts.
//!
//! # Tables
//!
//! - `tool_states`: owner:tool -> state_data
//! - `tool_cooccurrence`: owner:tool_a:tool_b -> count (pair names sorted)
//!
//! Tool names never contain ':', so keys are split from the right.

use crate::range_utils::prefix_range;
use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const TOOL_STATE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tool_states");
const COOCCURRENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("tool_cooccurrence");

fn state_key(owner: &str, tool: &str) -> String {
    format!("{}:{}", owner, tool)
}

fn pair_key(owner: &str, tool_a: &str, tool_b: &str) -> String {
    if tool_a <= tool_b {
        format!("{}:{}:{}", owner, tool_a, tool_b)
    } else {
        format!("{}:{}:{}", owner, tool_b, tool_a)
    }
}

/// Split `owner:tool_a:tool_b` into its parts.
fn split_pair_key(key: &str) -> Option<(&str, &str, &str)> {
    let mut parts = key.rsplitn(3, ':');
    let tool_b = parts.next()?;
    let tool_a = parts.next()?;
    let owner = parts.next()?;
    Some((owner, tool_a, tool_b))
}

/// Low-level tool state storage with byte-level API
#[derive(Debug, Clone)]
pub struct ToolStateStorage {
    db: Arc<Database>,
}

impl ToolStateStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(TOOL_STATE_TABLE)?;
        write_txn.open_table(COOCCURRENCE_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn put_state_raw(&self, owner: &str, tool: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TOOL_STATE_TABLE)?;
            table.insert(state_key(owner, tool).as_str(), data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_state_raw(&self, owner: &str, tool: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOOL_STATE_TABLE)?;
        Ok(table
            .get(state_key(owner, tool).as_str())?
            .map(|value| value.value().to_vec()))
    }

    /// List the tool states of one conversation.
    pub fn list_states_for_owner_raw(&self, owner: &str) -> Result<Vec<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOOL_STATE_TABLE)?;

        let (start, end) = prefix_range(&format!("{}:", owner));
        let mut states = Vec::new();
        for item in table.range(start.as_str()..end.as_str())? {
            let (key, value) = item?;
            // "chat:42:web_search" also matches the "chat:" prefix
            if key.value().rsplit_once(':').map(|(o, _)| o) == Some(owner) {
                states.push(value.value().to_vec());
            }
        }
        Ok(states)
    }

    /// List every tool state across all conversations.
    pub fn list_states_raw(&self) -> Result<Vec<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOOL_STATE_TABLE)?;

        let mut states = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            states.push(value.value().to_vec());
        }
        Ok(states)
    }

    /// Increment the co-occurrence counter of an unordered tool pair.
    ///
    /// Returns the new count.
    pub fn increment_cooccurrence(&self, owner: &str, tool_a: &str, tool_b: &str) -> Result<u64> {
        let key = pair_key(owner, tool_a, tool_b);
        let write_txn = self.db.begin_write()?;
        let count = {
            let mut table = write_txn.open_table(COOCCURRENCE_TABLE)?;
            let current = table.get(key.as_str())?.map(|v| v.value()).unwrap_or(0);
            let count = current + 1;
            table.insert(key.as_str(), count)?;
            count
        };
        write_txn.commit()?;
        Ok(count)
    }

    /// List `(other_tool, count)` for every pair involving `tool` in one conversation.
    pub fn list_cooccurrence_for(&self, owner: &str, tool: &str) -> Result<Vec<(String, u64)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COOCCURRENCE_TABLE)?;

        let (start, end) = prefix_range(&format!("{}:", owner));
        let mut pairs = Vec::new();
        for item in table.range(start.as_str()..end.as_str())? {
            let (key, value) = item?;
            let Some((key_owner, tool_a, tool_b)) = split_pair_key(key.value()) else {
                continue;
            };
            if key_owner != owner {
                continue;
            }
            if tool_a == tool {
                pairs.push((tool_b.to_string(), value.value()));
            } else if tool_b == tool {
                pairs.push((tool_a.to_string(), value.value()));
            }
        }
        Ok(pairs)
    }
}
