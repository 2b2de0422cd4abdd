//! Per-conversation working memory buffer.
//!
//! Turns accumulate in the open segment of a [`WorkingContext`]. A segment is
//! consolidated into long-term memory when the conversation goes idle, when
//! it is cleared, or on request; overflowing important turns are promoted one
//! by one as they are evicted.

use super::render::render_memory_block;
use super::summary::summarize_segment;
use super::topic::{GENERAL_TOPIC, infer_topic};
use crate::clock::SharedClock;
use crate::config::WorkingConfig;
use crate::memory::{CreateMemoryOptions, MemoryStore, SearchOptions};
use crate::models::{
    Memory, MemoryType, MessageRole, Metadata, MetadataValue, Segment, WorkingContext,
    WorkingMessage,
};
use crate::session::SessionStore;
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const OVERFLOW_TAG: &str = "working_memory_overflow";
pub const SUMMARY_TAG: &str = "conversation_summary";

const SUMMARY_IMPORTANCE: f64 = 0.6;
/// Memories cached per context for the recent and strong lists
const CACHED_MEMORIES: usize = 5;

pub struct WorkingMemory {
    store: MemoryStore,
    sessions: Arc<SessionStore<WorkingContext>>,
    clock: SharedClock,
    config: WorkingConfig,
}

impl WorkingMemory {
    pub fn new(
        store: MemoryStore,
        sessions: Arc<SessionStore<WorkingContext>>,
        clock: SharedClock,
        config: WorkingConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &WorkingConfig {
        &self.config
    }

    /// Get or lazily create the context for `owner`.
    ///
    /// A new context warms its memory caches from the long-term store, which
    /// is how state is rebuilt after a restart.
    fn context(&self, owner: &str) -> Arc<Mutex<WorkingContext>> {
        let now = self.clock.now_ms();
        let (context, created) = self
            .sessions
            .get_or_create(owner, || WorkingContext::new(owner.to_string(), now));

        if created {
            let mut ctx = context.lock();
            if let Err(e) = self.refresh_caches(&mut ctx) {
                warn!(owner, error = %e, "Failed to warm working memory caches");
            }
            debug!(owner, "Created working context");
        }
        context
    }

    fn refresh_caches(&self, ctx: &mut WorkingContext) -> Result<()> {
        ctx.recent_memories = self.store.get_recent_memories(&ctx.owner, CACHED_MEMORIES, 0.0)?;
        ctx.strong_memories = self.store.get_strongest_memories(&ctx.owner, CACHED_MEMORIES)?;
        Ok(())
    }

    /// Append a turn to the open segment.
    ///
    /// Collapses the segment first when the conversation has been idle past
    /// the timeout, and evicts the oldest turns past the size cap, promoting
    /// important ones to long-term memory.
    pub fn add_message(
        &self,
        owner: &str,
        role: MessageRole,
        content: &str,
        importance: f64,
        metadata: Option<Metadata>,
    ) -> Result<WorkingMessage> {
        let context = self.context(owner);
        let mut ctx = context.lock();
        let now = self.clock.now_ms();

        if now - ctx.last_activity > self.config.idle_timeout_ms()
            && !ctx.current_segment.is_empty()
        {
            debug!(owner, "Idle timeout reached, collapsing segment before new turn");
            self.collapse_locked(&mut ctx)?;
        }

        let mut message = WorkingMessage::new(role, content.to_string(), importance, now);
        message.metadata = metadata;
        ctx.current_segment.messages.push(message.clone());
        ctx.last_activity = now;
        ctx.message_count += 1;

        let max = self.config.max_segment_messages.max(1);
        if ctx.current_segment.messages.len() > max {
            let excess = ctx.current_segment.messages.len() - max;
            let evicted: Vec<WorkingMessage> =
                ctx.current_segment.messages.drain(..excess).collect();
            for old in evicted {
                if old.importance > self.config.high_importance_threshold {
                    self.promote_overflow(owner, &old)?;
                }
            }
        }

        Ok(message)
    }

    fn promote_overflow(&self, owner: &str, message: &WorkingMessage) -> Result<Memory> {
        let mut metadata = message.metadata.clone().unwrap_or_default();
        metadata.insert("role".to_string(), message.role.to_string().into());
        metadata.insert("timestamp".to_string(), message.timestamp.into());

        let memory = self.store.create_memory(
            owner,
            &message.content,
            CreateMemoryOptions::new(MemoryType::Episodic, message.importance)
                .with_tags([OVERFLOW_TAG])
                .with_metadata(metadata),
        )?;
        debug!(owner, memory_id = %memory.id, "Promoted evicted working message");
        Ok(memory)
    }

    /// Token-budgeted subset of the open segment, in chronological order.
    ///
    /// The most recent turns are taken first; remaining budget goes to older
    /// turns ranked by importance plus topic and recency bonuses.
    pub fn get_context_messages(&self, owner: &str, max_tokens: usize) -> Vec<WorkingMessage> {
        let Some(context) = self.sessions.get(owner) else {
            return Vec::new();
        };
        let ctx = context.lock();
        let messages = &ctx.current_segment.messages;
        if messages.is_empty() {
            return Vec::new();
        }

        let now = self.clock.now_ms();
        let mut selected = vec![false; messages.len()];
        let mut used = 0usize;

        let recent_start = messages.len().saturating_sub(self.config.recent_window);
        for index in (recent_start..messages.len()).rev() {
            let cost = messages[index].token_estimate;
            if used + cost > max_tokens {
                break;
            }
            used += cost;
            selected[index] = true;
        }

        let segment_topic = infer_topic(&user_text(&ctx.current_segment));
        let mut older: Vec<(usize, f64)> = (0..recent_start)
            .map(|index| (index, self.relevance(&messages[index], segment_topic, now)))
            .collect();
        older.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        for (index, _) in older {
            let cost = messages[index].token_estimate;
            if used + cost <= max_tokens {
                used += cost;
                selected[index] = true;
            }
        }

        messages
            .iter()
            .zip(selected)
            .filter(|(_, keep)| *keep)
            .map(|(message, _)| message.clone())
            .collect()
    }

    fn relevance(&self, message: &WorkingMessage, segment_topic: &str, now: i64) -> f64 {
        let mut score = message.importance;

        if segment_topic != GENERAL_TOPIC && infer_topic(&message.content) == segment_topic {
            score += self.config.topic_bonus;
        }

        let window = self.config.recency_window_ms();
        if window > 0 {
            let age = (now - message.timestamp).max(0) as f64;
            let freshness = (1.0 - age / window as f64).max(0.0);
            score += self.config.max_recency_bonus * freshness;
        }
        score
    }

    /// Consolidate the open segment into long-term memory.
    ///
    /// Returns the summary memory, or `None` when there was nothing to collapse.
    pub fn collapse_segment(&self, owner: &str) -> Result<Option<Memory>> {
        let Some(context) = self.sessions.get(owner) else {
            return Ok(None);
        };
        let mut ctx = context.lock();
        self.collapse_locked(&mut ctx)
    }

    fn collapse_locked(&self, ctx: &mut WorkingContext) -> Result<Option<Memory>> {
        if ctx.current_segment.is_empty() || ctx.current_segment.consolidated {
            return Ok(None);
        }

        let now = self.clock.now_ms();
        let owner = ctx.owner.clone();
        let topic = infer_topic(&user_text(&ctx.current_segment));
        let summary = summarize_segment(&ctx.current_segment, topic, now);

        let mut metadata = Metadata::new();
        metadata.insert(
            "segment_id".to_string(),
            MetadataValue::from(ctx.current_segment.id.as_str()),
        );
        metadata.insert(
            "message_count".to_string(),
            (ctx.current_segment.messages.len() as i64).into(),
        );
        metadata.insert("started_at".to_string(), ctx.current_segment.started_at.into());
        metadata.insert("ended_at".to_string(), now.into());

        let summary_memory = self.store.create_memory(
            &owner,
            &summary,
            CreateMemoryOptions::new(MemoryType::Semantic, SUMMARY_IMPORTANCE)
                .with_tags([topic, SUMMARY_TAG])
                .with_metadata(metadata),
        )?;

        // Retire the segment before promoting so a retry cannot summarize it twice
        let mut finished = std::mem::replace(&mut ctx.current_segment, Segment::open(now));
        let messages = std::mem::take(&mut finished.messages);
        finished.consolidated = true;
        finished.ended_at = Some(now);
        finished.topic = Some(topic.to_string());
        finished.summary = Some(summary);
        ctx.retire_segment(finished);

        let mut promoted = 0usize;
        for message in messages.iter().filter(|m| m.role == MessageRole::User) {
            if message.importance <= self.config.high_importance_threshold {
                continue;
            }
            match self.store.create_memory(
                &owner,
                &message.content,
                CreateMemoryOptions::new(MemoryType::Episodic, message.importance)
                    .with_tags([topic])
                    .with_related(vec![summary_memory.id.clone()]),
            ) {
                Ok(_) => promoted += 1,
                Err(e) => warn!(owner = %owner, error = %e, "Failed to promote segment message"),
            }
        }

        info!(
            owner = %owner,
            topic,
            promoted,
            memory_id = %summary_memory.id,
            "Collapsed working memory segment"
        );
        Ok(Some(summary_memory))
    }

    /// Collapse every open segment idle past the timeout.
    ///
    /// Returns the owners whose segment was collapsed.
    pub fn collapse_idle_segments(&self) -> Result<Vec<String>> {
        let now = self.clock.now_ms();
        let mut collapsed = Vec::new();

        for owner in self.sessions.keys() {
            let Some(context) = self.sessions.get(&owner) else {
                continue;
            };
            let mut ctx = context.lock();
            if now - ctx.last_activity <= self.config.idle_timeout_ms() {
                continue;
            }
            match self.collapse_locked(&mut ctx) {
                Ok(Some(_)) => collapsed.push(owner),
                Ok(None) => {}
                Err(e) => warn!(owner = %owner, error = %e, "Failed to collapse idle segment"),
            }
        }
        Ok(collapsed)
    }

    /// Memory block for prompt injection: query matches, strongest and recent
    /// memories, deduplicated and capped.
    pub fn get_memory_context(&self, owner: &str, query: Option<&str>) -> Result<String> {
        let context = self.context(owner);
        let mut ctx = context.lock();
        self.refresh_caches(&mut ctx)?;

        let mut candidates: Vec<Memory> = Vec::new();
        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            candidates.extend(self.store.search_memories(
                owner,
                query,
                SearchOptions::with_limit(self.config.memory_context_limit),
            )?);
        }
        candidates.extend(ctx.strong_memories.iter().cloned());
        candidates.extend(ctx.recent_memories.iter().cloned());

        let mut seen = HashSet::new();
        candidates.retain(|memory| seen.insert(memory.id.clone()));
        candidates.truncate(self.config.memory_context_limit);

        Ok(render_memory_block(&candidates, self.clock.now_ms()))
    }

    /// Collapse any open segment, then drop the context entirely.
    pub fn clear_working_memory(&self, owner: &str) -> Result<Option<Memory>> {
        let summary = self.collapse_segment(owner)?;
        self.sessions.remove(owner);
        Ok(summary)
    }

    /// Change the importance of a turn already in the open segment.
    pub fn mark_important(&self, owner: &str, message_index: usize, importance: f64) -> bool {
        let Some(context) = self.sessions.get(owner) else {
            return false;
        };
        let mut ctx = context.lock();
        match ctx.current_segment.messages.get_mut(message_index) {
            Some(message) => {
                message.importance = importance.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// One-line description of a conversation's working state.
    pub fn summary_line(&self, owner: &str) -> String {
        let Some(context) = self.sessions.get(owner) else {
            return "Working memory: empty".to_string();
        };
        let ctx = context.lock();
        let topic = infer_topic(&user_text(&ctx.current_segment));
        format!(
            "Working memory: {} messages in current segment (topic: {}), {} this session, {} segments consolidated",
            ctx.current_segment.messages.len(),
            topic,
            ctx.message_count,
            ctx.segments_consolidated
        )
    }

    /// Digests of the latest consolidated segments, oldest first.
    pub fn recent_segments(&self, owner: &str) -> Vec<Segment> {
        self.sessions
            .get(owner)
            .map(|context| context.lock().recent_segments.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of the open segment, if the conversation has a context.
    pub fn current_segment(&self, owner: &str) -> Option<Segment> {
        self.sessions
            .get(owner)
            .map(|context| context.lock().current_segment.clone())
    }

    pub fn active_owners(&self) -> Vec<String> {
        self.sessions.keys()
    }
}

fn user_text(segment: &Segment) -> String {
    segment
        .user_messages()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::DecayConfig;
    use crate::models::RECENT_SEGMENTS;
    use crate::storage::Storage;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        clock: Arc<ManualClock>,
        store: MemoryStore,
        working: WorkingMemory,
    }

    fn fixture_with(config: WorkingConfig) -> Fixture {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("mira.db")).unwrap();
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = MemoryStore::new(storage, clock.clone(), DecayConfig::default());
        let working = WorkingMemory::new(
            store.clone(),
            Arc::new(SessionStore::new()),
            clock.clone(),
            config,
        );
        Fixture {
            _dir: dir,
            clock,
            store,
            working,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(WorkingConfig::default())
    }

    fn user(f: &Fixture, text: &str, importance: f64) {
        f.working
            .add_message("u1", MessageRole::User, text, importance, None)
            .unwrap();
    }

    fn tagged(f: &Fixture, tag: &str) -> Vec<Memory> {
        f.store
            .search_memories("u1", "", SearchOptions::with_limit(100).tagged(tag))
            .unwrap()
    }

    #[test]
    fn test_add_message_creates_context() {
        let f = fixture();
        let message = f
            .working
            .add_message("u1", MessageRole::User, "hello", 0.5, None)
            .unwrap();

        assert_eq!(message.token_estimate, 2);
        assert_eq!(f.working.current_segment("u1").unwrap().messages.len(), 1);
        assert_eq!(f.working.active_owners(), vec!["u1"]);
    }

    #[test]
    fn test_overflow_promotes_important_evictions() {
        let f = fixture_with(WorkingConfig {
            max_segment_messages: 3,
            ..WorkingConfig::default()
        });
        user(&f, "remember my locker code 4412", 0.9);
        user(&f, "small talk", 0.2);
        user(&f, "more small talk", 0.2);
        user(&f, "even more", 0.2);
        user(&f, "and more", 0.2);

        let segment = f.working.current_segment("u1").unwrap();
        assert_eq!(segment.messages.len(), 3);
        assert_eq!(segment.messages[0].content, "more small talk");

        let promoted = tagged(&f, OVERFLOW_TAG);
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].content, "remember my locker code 4412");
        assert_eq!(promoted[0].memory_type, MemoryType::Episodic);
    }

    #[test]
    fn test_idle_timeout_collapses_before_new_turn() {
        let f = fixture();
        user(&f, "I'd like a cappuccino", 0.5);
        f.clock.advance(Duration::from_secs(2 * 60 * 60 + 1));
        user(&f, "new day", 0.5);

        let segment = f.working.current_segment("u1").unwrap();
        assert_eq!(segment.messages.len(), 1);
        assert_eq!(segment.messages[0].content, "new day");

        let summaries = tagged(&f, SUMMARY_TAG);
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].has_tag("coffee"));
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let f = fixture();
        user(&f, "book a flight to Porto", 0.8);
        user(&f, "window seat please", 0.4);

        let summary = f.working.collapse_segment("u1").unwrap().unwrap();
        assert_eq!(summary.memory_type, MemoryType::Semantic);
        assert!(summary.has_tag("travel"));
        assert!(summary.content.contains("\"book a flight to Porto\""));
        assert!(f.working.collapse_segment("u1").unwrap().is_none());
        assert!(f.working.collapse_segment("nobody").unwrap().is_none());

        assert_eq!(tagged(&f, SUMMARY_TAG).len(), 1);
        let promoted = tagged(&f, "travel");
        // Summary plus the one important user turn
        assert_eq!(promoted.len(), 2);
        assert!(f.working.current_segment("u1").unwrap().is_empty());
    }

    #[test]
    fn test_collapse_idle_segments_only_touches_idle_owners() {
        let f = fixture();
        user(&f, "old conversation", 0.5);
        f.clock.advance(Duration::from_secs(3 * 60 * 60));
        f.working
            .add_message("u2", MessageRole::User, "fresh conversation", 0.5, None)
            .unwrap();

        assert_eq!(f.working.collapse_idle_segments().unwrap(), vec!["u1"]);
        assert!(f.working.collapse_idle_segments().unwrap().is_empty());
        assert_eq!(f.working.current_segment("u2").unwrap().messages.len(), 1);
    }

    #[test]
    fn test_context_messages_respect_budget() {
        let f = fixture();
        for i in 0..30 {
            // 40 chars -> 11 tokens each
            user(&f, &format!("{:040}", i), 0.5);
        }

        for budget in [0, 5, 11, 50, 121, 1000] {
            let selected = f.working.get_context_messages("u1", budget);
            let cost: usize = selected.iter().map(|m| m.token_estimate).sum();
            assert!(cost <= budget, "budget {budget} exceeded: {cost}");
            if budget >= 11 {
                assert_eq!(selected.last().unwrap().content, format!("{:040}", 29));
            }
            for pair in selected.windows(2) {
                assert!(pair[0].timestamp <= pair[1].timestamp);
            }
        }
        assert!(f.working.get_context_messages("nobody", 100).is_empty());
    }

    #[test]
    fn test_context_messages_prefer_relevant_older_turns() {
        let f = fixture();
        user(&f, "this one matters", 0.95);
        for i in 0..20 {
            user(&f, &format!("filler {:02}", i), 0.1);
        }

        // Room for the 10 recent turns (3 tokens each) plus the important one (5)
        let selected = f.working.get_context_messages("u1", 37);
        assert_eq!(selected.len(), 11);
        assert_eq!(selected[0].content, "this one matters");
        assert_eq!(selected[10].content, "filler 19");
    }

    #[test]
    fn test_mark_important_changes_promotion() {
        let f = fixture();
        user(&f, "my passport number is X123", 0.3);
        assert!(f.working.mark_important("u1", 0, 0.95));
        assert!(!f.working.mark_important("u1", 7, 0.95));
        assert!(!f.working.mark_important("nobody", 0, 0.95));

        f.working.collapse_segment("u1").unwrap();
        let promoted = f
            .store
            .search_memories(
                "u1",
                "passport",
                SearchOptions {
                    types: vec![MemoryType::Episodic],
                    ..SearchOptions::default().tagged("travel")
                },
            )
            .unwrap();
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].memory_type, MemoryType::Episodic);
    }

    #[test]
    fn test_memory_context_dedupes_and_caps() {
        let f = fixture();
        for i in 0..12 {
            f.store
                .create_memory(
                    "u1",
                    &format!("espresso fact {}", i),
                    CreateMemoryOptions::new(MemoryType::Semantic, 0.5),
                )
                .unwrap();
        }

        let block = f.working.get_memory_context("u1", Some("espresso")).unwrap();
        assert!(block.starts_with("Relevant memories:\n"));
        assert_eq!(block.lines().count(), 1 + 8);
        assert!(block.contains("today"));

        assert_eq!(f.working.get_memory_context("u2", None).unwrap(), "");
    }

    #[test]
    fn test_clear_working_memory() {
        let f = fixture();
        user(&f, "grocery list: milk", 0.5);

        assert!(f.working.clear_working_memory("u1").unwrap().is_some());
        assert!(f.working.current_segment("u1").is_none());
        assert_eq!(f.working.summary_line("u1"), "Working memory: empty");
        assert!(f.working.clear_working_memory("u1").unwrap().is_none());
    }

    #[test]
    fn test_summary_line() {
        let f = fixture();
        user(&f, "rain tomorrow?", 0.5);
        assert_eq!(
            f.working.summary_line("u1"),
            "Working memory: 1 messages in current segment (topic: weather), 1 this session, 0 segments consolidated"
        );
    }

    #[test]
    fn test_long_conversation_keeps_bounded_segment_history() {
        let f = fixture();
        for i in 0..20 {
            user(&f, &format!("turn {}", i), 0.5);
            f.clock.advance(Duration::from_secs(3 * 60 * 60));
        }

        assert_eq!(
            f.working.summary_line("u1"),
            "Working memory: 1 messages in current segment (topic: general), 20 this session, 19 segments consolidated"
        );
        let history = f.working.recent_segments("u1");
        assert_eq!(history.len(), RECENT_SEGMENTS);
        assert!(history.iter().all(|s| s.consolidated && s.messages.is_empty()));
        assert!(history.iter().all(|s| s.summary.is_some()));
        assert_eq!(tagged(&f, SUMMARY_TAG).len(), 19);
    }

    #[test]
    fn test_collapse_retires_segment_with_digest() {
        let f = fixture();
        user(&f, "my flight lands at 6am", 0.9);
        let open_id = f.working.current_segment("u1").unwrap().id;

        f.working.collapse_segment("u1").unwrap().unwrap();

        let history = f.working.recent_segments("u1");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, open_id);
        assert_eq!(history[0].topic.as_deref(), Some("travel"));
        assert!(history[0].ended_at.is_some());
        assert_ne!(f.working.current_segment("u1").unwrap().id, open_id);
        assert!(f.working.recent_segments("nobody").is_empty());
    }

    #[test]
    fn test_idle_sweep_collapses_every_idle_owner_once() {
        let f = fixture();
        for owner in ["u1", "u2", "u3"] {
            f.working
                .add_message(owner, MessageRole::User, "remember the gate code 7781", 0.9, None)
                .unwrap();
        }
        f.clock.advance(Duration::from_secs(3 * 60 * 60));

        let mut collapsed = f.working.collapse_idle_segments().unwrap();
        collapsed.sort();
        assert_eq!(collapsed, vec!["u1", "u2", "u3"]);
        assert!(f.working.collapse_idle_segments().unwrap().is_empty());

        for owner in ["u1", "u2", "u3"] {
            let summaries = f
                .store
                .search_memories(owner, "", SearchOptions::with_limit(10).tagged(SUMMARY_TAG))
                .unwrap();
            assert_eq!(summaries.len(), 1, "{owner}");
        }
    }
}
