//! Long-term memory models.
//!
//! ```text
//! Memory (decaying)              DomainDoc (permanent)
//! ├── strength: checkpoint       ├── id: sha256(owner, title)
//! ├── strength_checkpointed_at   └── content
//! └── related_ids ──┐
//!                   ▼
//!              MemoryLink (source -> target, link_type, strength)
//! ```

use super::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Memory type, which selects the decay rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// Event-specific recall, fades fastest
    #[default]
    Episodic,
    /// Facts and summaries
    Semantic,
    /// Skills and habits, fades slowest
    Procedural,
}

impl MemoryType {
    pub const ALL: [MemoryType; 3] = [Self::Episodic, Self::Semantic, Self::Procedural];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Procedural => "procedural",
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "episodic" => Ok(Self::Episodic),
            "semantic" => Ok(Self::Semantic),
            "procedural" => Ok(Self::Procedural),
            other => anyhow::bail!("Unknown memory type: {}", other),
        }
    }
}

/// A decaying long-term memory record.
///
/// `strength` is a checkpoint taken at `strength_checkpointed_at`; the live
/// value is always a decay projection from that point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,

    /// Conversation key this memory belongs to
    pub owner: String,

    pub content: String,

    pub memory_type: MemoryType,

    /// Checkpointed strength in [0, 1]
    pub strength: f64,

    /// Author-assigned weight in [0, 1], independent of decay
    pub importance: f64,

    /// Unix timestamp in milliseconds
    pub created_at: i64,

    pub last_accessed: i64,

    /// When `strength` was last written
    pub strength_checkpointed_at: i64,

    pub access_count: u32,

    #[serde(default)]
    pub related_ids: BTreeSet<String>,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Memory {
    /// Create a fresh memory at full strength.
    pub fn new(owner: String, content: String, memory_type: MemoryType, now_ms: i64) -> Self {
        Self {
            id: format!("mem-{}", uuid::Uuid::new_v4()),
            owner,
            content,
            memory_type,
            strength: 1.0,
            importance: 0.5,
            created_at: now_ms,
            last_accessed: now_ms,
            strength_checkpointed_at: now_ms,
            access_count: 1,
            related_ids: BTreeSet::new(),
            metadata: Metadata::new(),
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Relationship carried by a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Related,
    CausedBy,
    LeadsTo,
    Contradicts,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Related => "related",
            Self::CausedBy => "caused_by",
            Self::LeadsTo => "leads_to",
            Self::Contradicts => "contradicts",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "related" => Ok(Self::Related),
            "caused_by" => Ok(Self::CausedBy),
            "leads_to" => Ok(Self::LeadsTo),
            "contradicts" => Ok(Self::Contradicts),
            other => anyhow::bail!("Unknown link type: {}", other),
        }
    }
}

/// Directed link between two memories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryLink {
    pub source: String,
    pub target: String,
    pub link_type: LinkType,
    pub strength: f64,
    pub created_at: i64,
}

impl MemoryLink {
    /// The endpoint that is not `memory_id`.
    pub fn other_end(&self, memory_id: &str) -> &str {
        if self.source == memory_id {
            &self.target
        } else {
            &self.source
        }
    }
}

/// A memory reached through a link, with its own live strength.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedMemory {
    pub memory: Memory,
    pub link: MemoryLink,
    pub live_strength: f64,
}

/// Permanent reference document. Never decays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDoc {
    /// Derived from owner and title, so re-saving updates in place
    pub id: String,
    pub owner: String,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DomainDoc {
    pub fn new(owner: String, title: String, content: String, now_ms: i64) -> Self {
        Self {
            id: Self::derive_id(&owner, &title),
            owner,
            title,
            content,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn derive_id(owner: &str, title: &str) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(owner.as_bytes());
        hasher.update([0u8]);
        hasher.update(title.as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("doc-{}", &hash[..16])
    }
}

/// Per-conversation memory statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total: u32,
    pub episodic: u32,
    pub semantic: u32,
    pub procedural: u32,
    /// Mean live strength
    pub average_strength: f64,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
}

/// Result of a decay sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecayReport {
    pub scanned: usize,
    pub pruned: usize,
    pub checkpointed: usize,
}
