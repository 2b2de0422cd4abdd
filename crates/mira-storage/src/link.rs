//! Link storage - directed edges between memories.
//!
//! # Tables
//!
//! - `memory_links`: source_id:target_id -> link_data
//! - `memory_link_target_index`: target_id:source_id -> source_id (reverse lookup)

use crate::range_utils::prefix_range;
use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::sync::Arc;
use tracing::debug;

const LINK_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memory_links");
/// Index: target_id:source_id -> source_id
const TARGET_INDEX_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("memory_link_target_index");

fn link_key(source: &str, target: &str) -> String {
    format!("{}:{}", source, target)
}

/// Low-level link storage with byte-level API
#[derive(Debug, Clone)]
pub struct LinkStorage {
    db: Arc<Database>,
}

impl LinkStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(LINK_TABLE)?;
        write_txn.open_table(TARGET_INDEX_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert or replace the link `source -> target`.
    pub fn put_link_raw(&self, source: &str, target: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut link_table = write_txn.open_table(LINK_TABLE)?;
            link_table.insert(link_key(source, target).as_str(), data)?;

            let mut target_index = write_txn.open_table(TARGET_INDEX_TABLE)?;
            target_index.insert(link_key(target, source).as_str(), source)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get raw link data
    pub fn get_link_raw(&self, source: &str, target: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LINK_TABLE)?;

        if let Some(value) = table.get(link_key(source, target).as_str())? {
            Ok(Some(value.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List every link that starts or ends at `memory_id`.
    pub fn list_links_touching_raw(&self, memory_id: &str) -> Result<Vec<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let link_table = read_txn.open_table(LINK_TABLE)?;
        let target_index = read_txn.open_table(TARGET_INDEX_TABLE)?;

        let (start, end) = prefix_range(&format!("{}:", memory_id));
        let mut links = Vec::new();

        for item in link_table.range(start.as_str()..end.as_str())? {
            let (_, value) = item?;
            links.push(value.value().to_vec());
        }

        for item in target_index.range(start.as_str()..end.as_str())? {
            let (_, value) = item?;
            let source = value.value();
            // Self-links were already collected by the outgoing scan
            if source == memory_id {
                continue;
            }
            if let Some(data) = link_table.get(link_key(source, memory_id).as_str())? {
                links.push(data.value().to_vec());
            }
        }

        Ok(links)
    }

    /// Delete a single link, returns true if it existed.
    pub fn delete_link(&self, source: &str, target: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut link_table = write_txn.open_table(LINK_TABLE)?;
            let existed = link_table.remove(link_key(source, target).as_str())?.is_some();

            let mut target_index = write_txn.open_table(TARGET_INDEX_TABLE)?;
            target_index.remove(link_key(target, source).as_str())?;

            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Delete every link touching `memory_id` in a single transaction.
    ///
    /// Returns the number of links removed.
    pub fn delete_links_for_memory(&self, memory_id: &str) -> Result<u32> {
        let prefix = format!("{}:", memory_id);
        let (start, end) = prefix_range(&prefix);

        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut link_table = write_txn.open_table(LINK_TABLE)?;
            let mut target_index = write_txn.open_table(TARGET_INDEX_TABLE)?;

            let mut outgoing = Vec::new();
            for item in link_table.range(start.as_str()..end.as_str())? {
                let (key, _) = item?;
                if let Some(target) = key.value().strip_prefix(&prefix) {
                    outgoing.push(target.to_string());
                }
            }

            let mut incoming = Vec::new();
            for item in target_index.range(start.as_str()..end.as_str())? {
                let (_, value) = item?;
                incoming.push(value.value().to_string());
            }

            let mut deleted = 0u32;
            for target in &outgoing {
                if link_table.remove(link_key(memory_id, target).as_str())?.is_some() {
                    deleted += 1;
                }
                target_index.remove(link_key(target, memory_id).as_str())?;
            }
            for source in &incoming {
                if link_table.remove(link_key(source, memory_id).as_str())?.is_some() {
                    deleted += 1;
                }
                target_index.remove(link_key(memory_id, source).as_str())?;
            }

            deleted
        };
        write_txn.commit()?;

        if deleted > 0 {
            debug!(memory_id, deleted, "Cascade-deleted memory links");
        }
        Ok(deleted)
    }

    /// Count all links
    pub fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LINK_TABLE)?;
        Ok(table.len()? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_storage() -> LinkStorage {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.db")).unwrap());
        LinkStorage::new(db).unwrap()
    }

    #[test]
    fn test_put_link_is_upsert() {
        let storage = create_test_storage();

        storage.put_link_raw("mem-a", "mem-b", b"v1").unwrap();
        storage.put_link_raw("mem-a", "mem-b", b"v2").unwrap();

        assert_eq!(storage.count().unwrap(), 1);
        assert_eq!(storage.get_link_raw("mem-a", "mem-b").unwrap().unwrap(), b"v2");
        assert!(storage.get_link_raw("mem-b", "mem-a").unwrap().is_none());
    }

    #[test]
    fn test_list_links_touching_both_directions() {
        let storage = create_test_storage();

        storage.put_link_raw("mem-a", "mem-b", b"ab").unwrap();
        storage.put_link_raw("mem-c", "mem-a", b"ca").unwrap();
        storage.put_link_raw("mem-b", "mem-c", b"bc").unwrap();

        let mut links = storage.list_links_touching_raw("mem-a").unwrap();
        links.sort();
        assert_eq!(links, vec![b"ab".to_vec(), b"ca".to_vec()]);
    }

    #[test]
    fn test_delete_links_for_memory_cascades() {
        let storage = create_test_storage();

        storage.put_link_raw("mem-a", "mem-b", b"ab").unwrap();
        storage.put_link_raw("mem-c", "mem-a", b"ca").unwrap();
        storage.put_link_raw("mem-b", "mem-c", b"bc").unwrap();

        assert_eq!(storage.delete_links_for_memory("mem-a").unwrap(), 2);
        assert_eq!(storage.count().unwrap(), 1);
        assert!(storage.list_links_touching_raw("mem-a").unwrap().is_empty());
        assert_eq!(storage.list_links_touching_raw("mem-b").unwrap(), vec![b"bc".to_vec()]);
    }

    #[test]
    fn test_delete_single_link() {
        let storage = create_test_storage();

        storage.put_link_raw("mem-a", "mem-b", b"ab").unwrap();
        assert!(storage.delete_link("mem-a", "mem-b").unwrap());
        assert!(!storage.delete_link("mem-a", "mem-b").unwrap());
        assert!(storage.list_links_touching_raw("mem-b").unwrap().is_empty());
    }
}
