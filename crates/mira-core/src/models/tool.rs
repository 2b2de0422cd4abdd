//! Tool activation models.

use super::metadata::Metadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Permanently active
    Core,
    Search,
    Information,
    Browser,
    Productivity,
    Shopping,
    Navigation,
}

/// Static description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Case-insensitive keywords that self-activate the tool
    pub triggers: Vec<String>,
    pub category: ToolCategory,
    pub always_active: bool,
}

impl ToolDefinition {
    pub fn on_demand(
        name: &str,
        description: &str,
        category: ToolCategory,
        triggers: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
            category,
            always_active: false,
        }
    }

    pub fn always_on(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            triggers: Vec::new(),
            category: ToolCategory::Core,
            always_active: true,
        }
    }
}

/// Activation state of one tool in one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    pub tool_name: String,
    pub owner: String,
    pub last_used_at: Option<i64>,
    pub activated_at: Option<i64>,
    /// Uses during the current activation
    pub use_count: u32,
    pub enabled: bool,
    pub turns_since_use: u32,
    /// Lifetime uses
    pub total_uses: u64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ToolState {
    pub fn new(owner: &str, tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            owner: owner.to_string(),
            last_used_at: None,
            activated_at: None,
            use_count: 0,
            enabled: false,
            turns_since_use: 0,
            total_uses: 0,
            metadata: Metadata::new(),
        }
    }
}

/// Unordered pair of tools used together in one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoOccurrence {
    pub tool_a: String,
    pub tool_b: String,
    pub owner: String,
    pub count: u64,
}

/// A tool reported by `get_active_tools`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveTool {
    pub definition: ToolDefinition,
    pub use_count: u32,
    pub total_uses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_are_lowercased() {
        let tool = ToolDefinition::on_demand("maps", "Maps", ToolCategory::Navigation, &["Directions"]);
        assert_eq!(tool.triggers, vec!["directions"]);
        assert!(!tool.always_active);
    }
}
