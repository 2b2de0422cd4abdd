//! Background maintenance events and their results.

use super::memory::DecayReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An event handled by the event processor loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Collapse idle open segments
    SegmentCollapse,
    /// Run the long-term memory decay sweep
    MemoryDecay,
    /// Cross-memory linking and pattern extraction
    DreamConsolidate,
    /// Global tool expiry sweep
    ToolExpiry,
    /// Routed to a registered handler by name
    Custom {
        name: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl EngineEvent {
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::SegmentCollapse => "segment_collapse",
            Self::MemoryDecay => "memory_decay",
            Self::DreamConsolidate => "dream_consolidate",
            Self::ToolExpiry => "tool_expiry",
            Self::Custom { .. } => "custom",
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { name, .. } => write!(f, "custom:{}", name),
            other => f.write_str(other.kind()),
        }
    }
}

/// Result of a dream consolidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DreamReport {
    pub owners_scanned: usize,
    pub links_created: usize,
    pub patterns_created: usize,
}

/// Results of a forced sleep cycle, one field per maintenance step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SleepCycleReport {
    /// Owners whose idle segment was collapsed
    pub collapsed: Vec<String>,
    pub decay: DecayReport,
    pub dream: DreamReport,
    /// (owner, tool) pairs deactivated by the expiry sweep
    pub expired_tools: Vec<(String, String)>,
}
