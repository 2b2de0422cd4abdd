//! MIRA Storage - Low-level storage abstraction layer
//!
//! This crate provides the persistence layer for the MIRA memory engine,
//! using redb as the embedded database. It exposes byte-level APIs so the
//! typed models can live in `mira-core` without a circular dependency.
//!
//! # Tables
//!
//! - `memories` - Long-term memory records (+ owner, type and strength indices)
//! - `memory_links` - Directed links between memories
//! - `domain_docs` - Permanent reference documents
//! - `tool_states` - Per-conversation tool activation state
//! - `tool_cooccurrence` - Pairwise tool usage counters

pub mod domain_doc;
pub mod link;
pub mod memory;
pub mod paths;
pub mod range_utils;
pub mod simple_storage;
pub mod tool_state;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use domain_doc::DomainDocStorage;
pub use link::LinkStorage;
pub use memory::{MemoryIndexKeys, MemoryStorage};
pub use simple_storage::SimpleStorage;
pub use tool_state::ToolStateStorage;

/// Central storage manager that initializes all storage subsystems
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
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path.as_ref())?);
        Self::from_database(db)
    }

    /// Initialize all tables on an already opened database.
    pub fn from_database(db: Arc<Database>) -> Result<Self> {
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
