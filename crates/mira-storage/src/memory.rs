//! Memory storage - byte-level API for long-term memory persistence.
//!
//! Provides low-level storage operations for decaying memory records using
//! the redb embedded database. Records are indexed by owner, memory type and
//! checkpointed strength so decay sweeps and per-conversation scans stay cheap.
//!
//! # Tables
//!
//! - `memories`: memory_id -> memory_data
//! - `memory_owner_index`: owner:memory_id -> memory_id
//! - `memory_type_index`: memory_type:memory_id -> memory_id
//! - `memory_strength_index`: strength:memory_id -> memory_id (strength in millionths)

use crate::range_utils::{prefix_range, strength_key};
use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeSet;
use std::sync::Arc;

const MEMORY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memories");

/// Index: owner:memory_id -> memory_id
const OWNER_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("memory_owner_index");
/// Index: memory_type:memory_id -> memory_id
const TYPE_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("memory_type_index");
/// Index: strength:memory_id -> memory_id
const STRENGTH_INDEX_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("memory_strength_index");

/// Index values for a stored memory record.
///
/// The byte-level layer cannot look inside the serialized record, so callers
/// pass the indexed fields alongside the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryIndexKeys<'a> {
    pub owner: &'a str,
    pub memory_type: &'a str,
    pub strength: f64,
}

impl<'a> MemoryIndexKeys<'a> {
    pub fn new(owner: &'a str, memory_type: &'a str, strength: f64) -> Self {
        Self {
            owner,
            memory_type,
            strength,
        }
    }

    fn owner_key(&self, memory_id: &str) -> String {
        format!("{}:{}", self.owner, memory_id)
    }

    fn type_key(&self, memory_id: &str) -> String {
        format!("{}:{}", self.memory_type, memory_id)
    }

    fn strength_key(&self, memory_id: &str) -> String {
        format!("{}:{}", strength_key(self.strength), memory_id)
    }
}

/// Low-level memory storage with byte-level API
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    db: Arc<Database>,
}

impl MemoryStorage {
    /// Create a new MemoryStorage instance
    pub fn new(db: Arc<Database>) -> Result<Self> {
        // Initialize all tables
        let write_txn = db.begin_write()?;
        write_txn.open_table(MEMORY_TABLE)?;
        write_txn.open_table(OWNER_INDEX_TABLE)?;
        write_txn.open_table(TYPE_INDEX_TABLE)?;
        write_txn.open_table(STRENGTH_INDEX_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store a raw memory record with all necessary indexes.
    ///
    /// # Arguments
    /// - `memory_id`: Unique identifier for the memory
    /// - `keys`: Indexed fields of the new record
    /// - `previous`: Indexed fields of the record being replaced, if any
    /// - `data`: Serialized memory data
    pub fn put_memory_raw(
        &self,
        memory_id: &str,
        keys: &MemoryIndexKeys<'_>,
        previous: Option<&MemoryIndexKeys<'_>>,
        data: &[u8],
    ) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut memory_table = write_txn.open_table(MEMORY_TABLE)?;
            memory_table.insert(memory_id, data)?;

            let mut owner_index = write_txn.open_table(OWNER_INDEX_TABLE)?;
            let mut type_index = write_txn.open_table(TYPE_INDEX_TABLE)?;
            let mut strength_index = write_txn.open_table(STRENGTH_INDEX_TABLE)?;

            // Drop stale index entries before writing the new ones
            if let Some(prev) = previous {
                owner_index.remove(prev.owner_key(memory_id).as_str())?;
                type_index.remove(prev.type_key(memory_id).as_str())?;
                strength_index.remove(prev.strength_key(memory_id).as_str())?;
            }

            owner_index.insert(keys.owner_key(memory_id).as_str(), memory_id)?;
            type_index.insert(keys.type_key(memory_id).as_str(), memory_id)?;
            strength_index.insert(keys.strength_key(memory_id).as_str(), memory_id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get raw memory data by ID
    pub fn get_memory_raw(&self, memory_id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMORY_TABLE)?;

        if let Some(value) = table.get(memory_id)? {
            Ok(Some(value.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List all memories for an owner
    pub fn list_memories_by_owner_raw(&self, owner: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.list_by_index(OWNER_INDEX_TABLE, &format!("{}:", owner))
    }

    /// List all memories of a given type
    pub fn list_memories_by_type_raw(&self, memory_type: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.list_by_index(TYPE_INDEX_TABLE, &format!("{}:", memory_type))
    }

    /// List every stored memory
    pub fn list_all_raw(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMORY_TABLE)?;

        let mut items = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            items.push((key.value().to_string(), value.value().to_vec()));
        }

        Ok(items)
    }

    /// List IDs whose checkpointed strength is strictly below `strength`.
    ///
    /// Stored strength is an upper bound of the live (decayed) strength, so
    /// every returned memory is at or below the bound right now.
    pub fn list_ids_below_strength(&self, strength: f64) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let strength_index = read_txn.open_table(STRENGTH_INDEX_TABLE)?;

        let end = format!("{}:", strength_key(strength));
        let mut ids = Vec::new();
        for item in strength_index.range(..end.as_str())? {
            let (_, value) = item?;
            ids.push(value.value().to_string());
        }

        Ok(ids)
    }

    /// List the distinct owners that have at least one memory.
    pub fn list_owners(&self) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let owner_index = read_txn.open_table(OWNER_INDEX_TABLE)?;

        let mut owners = BTreeSet::new();
        for item in owner_index.iter()? {
            let (key, _) = item?;
            // Memory IDs never contain ':', owners might
            if let Some((owner, _)) = key.value().rsplit_once(':') {
                owners.insert(owner.to_string());
            }
        }

        Ok(owners.into_iter().collect())
    }

    /// Delete a memory and all its index entries.
    ///
    /// Note: Requires the indexed fields to be known for proper index cleanup.
    pub fn delete_memory(&self, memory_id: &str, keys: &MemoryIndexKeys<'_>) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut memory_table = write_txn.open_table(MEMORY_TABLE)?;
            let existed = memory_table.remove(memory_id)?.is_some();

            let mut owner_index = write_txn.open_table(OWNER_INDEX_TABLE)?;
            owner_index.remove(keys.owner_key(memory_id).as_str())?;

            let mut type_index = write_txn.open_table(TYPE_INDEX_TABLE)?;
            type_index.remove(keys.type_key(memory_id).as_str())?;

            let mut strength_index = write_txn.open_table(STRENGTH_INDEX_TABLE)?;
            strength_index.remove(keys.strength_key(memory_id).as_str())?;

            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Count all memories
    pub fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMORY_TABLE)?;
        Ok(table.len()? as usize)
    }

    /// Count memories for an owner
    pub fn count_by_owner(&self, owner: &str) -> Result<u32> {
        let read_txn = self.db.begin_read()?;
        let owner_index = read_txn.open_table(OWNER_INDEX_TABLE)?;

        let (start, end) = prefix_range(&format!("{}:", owner));
        let mut count = 0u32;
        for item in owner_index.range(start.as_str()..end.as_str())? {
            item?;
            count += 1;
        }

        Ok(count)
    }

    fn list_by_index(
        &self,
        index: TableDefinition<&str, &str>,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let index_table = read_txn.open_table(index)?;
        let memory_table = read_txn.open_table(MEMORY_TABLE)?;

        let (start, end) = prefix_range(prefix);
        let mut memories = Vec::new();
        for item in index_table.range(start.as_str()..end.as_str())? {
            let (_, value) = item?;
            let memory_id = value.value();
            if let Some(data) = memory_table.get(memory_id)? {
                memories.push((memory_id.to_string(), data.value().to_vec()));
            }
        }

        Ok(memories)
    }
}
