//! Human-readable rendering of memories for prompt injection.

use crate::clock::MS_PER_DAY;
use crate::models::{Memory, WorkingMessage};

/// "today", "yesterday" or "N days ago".
pub fn relative_age(now_ms: i64, then_ms: i64) -> String {
    match (now_ms - then_ms).max(0) / MS_PER_DAY {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        days => format!("{} days ago", days),
    }
}

/// Render memories as a bullet block. Empty input renders nothing.
pub fn render_memory_block(memories: &[Memory], now_ms: i64) -> String {
    if memories.is_empty() {
        return String::new();
    }

    let mut block = String::from("Relevant memories:\n");
    for memory in memories {
        block.push_str(&format!(
            "- [{}, {}, strength {:.2}] {}\n",
            relative_age(now_ms, memory.created_at),
            memory.memory_type,
            memory.strength,
            memory.content
        ));
    }
    block
}

/// Render the selected conversation turns in chronological order.
pub fn render_recent_turns(messages: &[WorkingMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }

    let mut block = String::from("Recent conversation:\n");
    for message in messages {
        block.push_str(&format!("- {}: {}\n", message.role, message.content));
    }
    block
}
