//! Engine configuration.
//!
//! Loads from `~/.config/mira/config.toml`. Every field has a default, so a
//! partial file only overrides what it names.

use crate::error::{MiraError, Result};
use crate::models::MemoryType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiraConfig {
    pub decay: DecayConfig,
    pub working: WorkingConfig,
    pub tools: ToolsConfig,
    pub scheduler: SchedulerConfig,
    pub consolidation: ConsolidationConfig,
}

/// Decay parameters for one memory type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayParams {
    /// Days for the live strength to halve
    pub half_life_days: f64,
    /// Strength added on each boosted access
    pub boost_on_access: f64,
    /// Live strength below which the memory is deleted
    pub forget_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    pub max_strength: f64,
    pub episodic: DecayParams,
    pub semantic: DecayParams,
    pub procedural: DecayParams,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            max_strength: 1.0,
            episodic: DecayParams {
                half_life_days: 7.0,
                boost_on_access: 0.2,
                forget_threshold: 0.1,
            },
            semantic: DecayParams {
                half_life_days: 30.0,
                boost_on_access: 0.1,
                forget_threshold: 0.05,
            },
            procedural: DecayParams {
                half_life_days: 90.0,
                boost_on_access: 0.05,
                forget_threshold: 0.05,
            },
        }
    }
}

impl DecayConfig {
    pub fn params(&self, memory_type: MemoryType) -> &DecayParams {
        match memory_type {
            MemoryType::Episodic => &self.episodic,
            MemoryType::Semantic => &self.semantic,
            MemoryType::Procedural => &self.procedural,
        }
    }

    /// Lowest forget threshold across all types.
    pub fn min_forget_threshold(&self) -> f64 {
        self.episodic
            .forget_threshold
            .min(self.semantic.forget_threshold)
            .min(self.procedural.forget_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingConfig {
    /// Messages kept in the open segment before the oldest are evicted
    pub max_segment_messages: usize,
    /// Idle time after which the open segment is collapsed
    pub idle_timeout_secs: u64,
    /// Messages above this importance are promoted to long-term memory
    pub high_importance_threshold: f64,
    /// Most recent messages always considered first for context
    pub recent_window: usize,
    pub topic_bonus: f64,
    pub max_recency_bonus: f64,
    pub recency_window_secs: u64,
    /// Cap on memories rendered into the memory context block
    pub memory_context_limit: usize,
    /// Token budget used when the facade assembles a turn context
    pub context_token_budget: usize,
}

impl Default for WorkingConfig {
    fn default() -> Self {
        Self {
            max_segment_messages: 50,
            idle_timeout_secs: 2 * 60 * 60,
            high_importance_threshold: 0.7,
            recent_window: 10,
            topic_bonus: 0.2,
            max_recency_bonus: 0.3,
            recency_window_secs: 60 * 60,
            memory_context_limit: 8,
            context_token_budget: 2000,
        }
    }
}

impl WorkingConfig {
    pub fn idle_timeout_ms(&self) -> i64 {
        self.idle_timeout_secs as i64 * 1000
    }

    pub fn recency_window_ms(&self) -> i64 {
        self.recency_window_secs as i64 * 1000
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Idle turns a self-activated tool survives
    pub ttl_turns: u32,
    pub max_active_tools: usize,
    pub max_suggestions: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ttl_turns: 5,
            max_active_tools: 5,
            max_suggestions: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub segment_check_secs: u64,
    pub decay_secs: u64,
    pub dream_secs: u64,
    pub tool_expiry_secs: u64,
    /// Bound of the command channel feeding the processor loop
    pub queue_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            segment_check_secs: 5 * 60,
            decay_secs: 24 * 60 * 60,
            dream_secs: 6 * 60 * 60,
            tool_expiry_secs: 10 * 60,
            queue_capacity: 256,
        }
    }
}

impl SchedulerConfig {
    pub fn segment_check_interval(&self) -> Duration {
        Duration::from_secs(self.segment_check_secs.max(1))
    }

    pub fn decay_interval(&self) -> Duration {
        Duration::from_secs(self.decay_secs.max(1))
    }

    pub fn dream_interval(&self) -> Duration {
        Duration::from_secs(self.dream_secs.max(1))
    }

    pub fn tool_expiry_interval(&self) -> Duration {
        Duration::from_secs(self.tool_expiry_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Jaccard similarity above which two memories are linked
    pub similarity_threshold: f64,
    /// Strongest memories compared per conversation
    pub max_memories: usize,
    /// Conversations with fewer memories are skipped
    pub min_memories: usize,
    /// Words shorter than this are ignored by the similarity measure
    pub min_word_len: usize,
    /// Occurrences needed before a tag becomes a pattern memory
    pub pattern_min_count: usize,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            max_memories: 20,
            min_memories: 2,
            min_word_len: 4,
            pattern_min_count: 3,
        }
    }
}

impl MiraConfig {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from_path(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path. A missing file yields defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| MiraError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mira").join("config.toml"))
    }
}
