//! Decay model for long-term memory strength.
//!
//! ```text
//! live  = checkpoint * 0.5^(days_since_checkpoint / half_life)
//! boost = min(max_strength, strength + boost_on_access)
//! ```
//!
//! Exponential decay is memoryless, so moving the checkpoint to "now" at
//! the live value never changes the curve.

use crate::clock::MS_PER_DAY;
use crate::config::DecayConfig;
use crate::models::{Memory, MemoryType};

#[derive(Debug, Clone, Default)]
pub struct DecayModel {
    config: DecayConfig,
}

impl DecayModel {
    pub fn new(config: DecayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    /// Project a checkpointed strength forward by `elapsed_ms`.
    pub fn project(&self, checkpoint: f64, elapsed_ms: i64, memory_type: MemoryType) -> f64 {
        let half_life = self.config.params(memory_type).half_life_days;
        let days = elapsed_ms.max(0) as f64 / MS_PER_DAY as f64;
        if half_life <= 0.0 {
            return 0.0;
        }
        checkpoint * 0.5f64.powf(days / half_life)
    }

    /// Live strength of a memory at `now_ms`.
    pub fn live_strength(&self, memory: &Memory, now_ms: i64) -> f64 {
        self.project(
            memory.strength,
            now_ms - memory.strength_checkpointed_at,
            memory.memory_type,
        )
    }

    pub fn boost(&self, strength: f64, memory_type: MemoryType) -> f64 {
        let amount = self.config.params(memory_type).boost_on_access;
        (strength + amount).min(self.config.max_strength)
    }

    pub fn forget_threshold(&self, memory_type: MemoryType) -> f64 {
        self.config.params(memory_type).forget_threshold
    }

    pub fn is_forgotten(&self, live_strength: f64, memory_type: MemoryType) -> bool {
        live_strength < self.forget_threshold(memory_type)
    }

    /// Days until a memory at `strength` crosses its forget threshold.
    pub fn days_until_forgotten(&self, strength: f64, memory_type: MemoryType) -> f64 {
        let params = self.config.params(memory_type);
        if strength <= params.forget_threshold {
            return 0.0;
        }
        params.half_life_days * (strength / params.forget_threshold).log2()
    }
}
