//! Working memory models - the per-conversation short-term buffer.

use super::memory::Memory;
use super::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Terminal segments a context keeps after consolidation
pub const RECENT_SEGMENTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        })
    }
}

/// Rough token cost of a piece of text.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: i64,
    pub importance: f64,
    pub token_estimate: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl WorkingMessage {
    pub fn new(role: MessageRole, content: String, importance: f64, timestamp: i64) -> Self {
        Self {
            role,
            token_estimate: estimate_tokens(&content),
            content,
            timestamp,
            importance: importance.clamp(0.0, 1.0),
            metadata: None,
        }
    }
}

/// A contiguous span of turns consolidated as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub messages: Vec<WorkingMessage>,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub topic: Option<String>,
    pub summary: Option<String>,
    pub consolidated: bool,
}

impl Segment {
    pub fn open(now_ms: i64) -> Self {
        Self {
            id: format!("seg-{}", uuid::Uuid::new_v4()),
            messages: Vec::new(),
            started_at: now_ms,
            ended_at: None,
            topic: None,
            summary: None,
            consolidated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn user_messages(&self) -> impl Iterator<Item = &WorkingMessage> {
        self.messages.iter().filter(|m| m.role == MessageRole::User)
    }
}

/// Per-conversation working state. In-memory only.
#[derive(Debug, Clone)]
pub struct WorkingContext {
    pub owner: String,
    pub current_segment: Segment,
    pub recent_memories: Vec<Memory>,
    pub strong_memories: Vec<Memory>,
    pub last_activity: i64,
    pub session_start: i64,
    /// Messages added since the context was created
    pub message_count: u64,
    pub segments_consolidated: u64,
    /// Latest terminal segments, newest last, with their messages dropped
    pub recent_segments: VecDeque<Segment>,
}

impl WorkingContext {
    pub fn new(owner: String, now_ms: i64) -> Self {
        Self {
            owner,
            current_segment: Segment::open(now_ms),
            recent_memories: Vec::new(),
            strong_memories: Vec::new(),
            last_activity: now_ms,
            session_start: now_ms,
            message_count: 0,
            segments_consolidated: 0,
            recent_segments: VecDeque::new(),
        }
    }

    /// Keep a consolidated segment as a message-less digest.
    pub fn retire_segment(&mut self, mut segment: Segment) {
        segment.messages = Vec::new();
        self.segments_consolidated += 1;
        if self.recent_segments.len() == RECENT_SEGMENTS {
            self.recent_segments.pop_front();
        }
        self.recent_segments.push_back(segment);
    }
}
