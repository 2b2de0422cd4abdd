//! Typed domain document storage wrapper.

use super::decode;
use crate::models::DomainDoc;
use anyhow::Result;
use redb::Database;
use std::sync::Arc;

/// Typed domain document storage wrapper around mira_storage::DomainDocStorage.
#[derive(Clone)]
pub struct DomainDocStorage {
    inner: mira_storage::DomainDocStorage,
}

impl DomainDocStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: mira_storage::DomainDocStorage::new(db)?,
        })
    }

    /// Store a document. Returns true if it replaced an existing one.
    pub fn save(&self, doc: &DomainDoc) -> Result<bool> {
        let json_bytes = serde_json::to_vec(doc)?;
        self.inner.put_raw(&doc.id, &json_bytes)
    }

    pub fn get(&self, id: &str) -> Result<Option<DomainDoc>> {
        Ok(self
            .inner
            .get_raw(id)?
            .and_then(|bytes| decode("domain_doc", id, &bytes)))
    }

    /// Documents of one conversation, sorted by title.
    pub fn list_by_owner(&self, owner: &str) -> Result<Vec<DomainDoc>> {
        let mut docs: Vec<DomainDoc> = self
            .inner
            .list_raw()?
            .into_iter()
            .filter_map(|(id, bytes)| decode::<DomainDoc>("domain_doc", &id, &bytes))
            .filter(|doc| doc.owner == owner)
            .collect();
        docs.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(docs)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        self.inner.delete(id)
    }

    pub fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}
