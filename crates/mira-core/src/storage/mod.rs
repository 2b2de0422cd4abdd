//! Storage layer with typed wrappers around mira-storage.
//!
//! Each wrapper converts between the models in [`crate::models`] and the
//! byte-level tables, serializing records as JSON.

pub mod domain_doc;
pub mod link;
pub mod memory;
pub mod tool_state;

use anyhow::Result;
use redb::Database;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub use domain_doc::DomainDocStorage;
pub use link::LinkStorage;
pub use memory::MemoryStorage;
pub use tool_state::ToolStateStorage;

/// Central storage manager that initializes all storage subsystems.
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
    pub memories: MemoryStorage,
    pub links: LinkStorage,
    pub domain_docs: DomainDocStorage,
    pub tool_states: ToolStateStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path.as_ref())?);

        let memories = MemoryStorage::new(db.clone())?;
        let links = LinkStorage::new(db.clone())?;
        let domain_docs = DomainDocStorage::new(db.clone())?;
        let tool_states = ToolStateStorage::new(db.clone())?;

        Ok(Self {
            db,
            memories,
            links,
            domain_docs,
            tool_states,
        })
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}

/// Decode a stored record, skipping it with a warning when it is malformed.
pub(crate) fn decode<T: DeserializeOwned>(kind: &str, key: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(kind, key, error = %e, "Skipping malformed record");
            None
        }
    }
}
