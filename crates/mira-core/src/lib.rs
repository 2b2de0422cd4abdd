//! MIRA Core - memory and tool activation engine for a conversational assistant.
//!
//! - [`memory`]: decaying long-term memory, links and domain docs
//! - [`working`]: per-conversation working memory and segment consolidation
//! - [`tools`]: self-expiring tool activation
//! - [`events`]: background maintenance scheduler
//!
//! [`Mira`] wires them together behind the per-turn API a chat loop calls.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod memory;
pub mod models;
pub mod session;
pub mod storage;
pub mod tools;
pub mod working;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::MiraConfig;
pub use error::MiraError;
pub use models::*;

use anyhow::Result;
use events::{EventProcessor, EventProcessorHandle};
use memory::{CreateMemoryOptions, MemoryStore, SearchOptions};
use serde::Serialize;
use session::SessionStore;
use std::path::Path;
use std::sync::Arc;
use storage::Storage;
use tools::{ToolRegistry, default_catalog};
use tracing::{debug, info};
use working::WorkingMemory;

/// Importance given to assistant turns in working memory.
const ASSISTANT_IMPORTANCE: f64 = 0.5;

/// What the caller needs to build the next prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnContext {
    pub context: String,
    /// Recent turns of the open segment, within the context token budget
    pub messages: Vec<WorkingMessage>,
    pub activated_tools: Vec<String>,
    pub expired_tools: Vec<String>,
}

/// The engine: one store, one working memory, one tool registry and the
/// event processor maintaining them.
pub struct Mira {
    store: MemoryStore,
    working: Arc<WorkingMemory>,
    tools: Arc<ToolRegistry>,
    events: Arc<EventProcessor>,
    config: MiraConfig,
}

impl Mira {
    /// Open (or create) the database at `db_path`.
    ///
    /// A store that cannot be opened is the one fatal error of the engine.
    pub fn open(
        db_path: impl AsRef<Path>,
        config: MiraConfig,
        clock: SharedClock,
    ) -> error::Result<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let storage = Storage::new(path).map_err(|source| MiraError::StoreInit {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Opened MIRA memory store");
        Ok(Self::with_storage(storage, config, clock))
    }

    /// Build the engine on an already opened storage.
    pub fn with_storage(storage: Storage, config: MiraConfig, clock: SharedClock) -> Self {
        let store = MemoryStore::new(storage.clone(), clock.clone(), config.decay.clone());
        let working = Arc::new(WorkingMemory::new(
            store.clone(),
            Arc::new(SessionStore::new()),
            clock.clone(),
            config.working.clone(),
        ));
        let tools = Arc::new(ToolRegistry::new(
            default_catalog(),
            storage.tool_states.clone(),
            clock,
            config.tools.clone(),
        ));
        let events = Arc::new(EventProcessor::new(
            working.clone(),
            store.clone(),
            tools.clone(),
            config.scheduler.clone(),
            config.consolidation.clone(),
        ));

        Self {
            store,
            working,
            tools,
            events,
            config,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn working(&self) -> &WorkingMemory {
        &self.working
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn events(&self) -> Arc<EventProcessor> {
        self.events.clone()
    }

    pub fn config(&self) -> &MiraConfig {
        &self.config
    }

    /// Start the background event processor on the current tokio runtime.
    pub fn start_events(&self) -> EventProcessorHandle {
        self.events.clone().start()
    }

    /// Handle one user turn.
    ///
    /// The tool turn advances before the new text can re-activate anything,
    /// so a tool activated at turn T and never used expires at T + TTL + 1.
    pub fn process_user_message(
        &self,
        owner: &str,
        text: &str,
        importance: f64,
    ) -> Result<TurnContext> {
        let expired_tools = self.tools.advance_turn(owner)?;
        self.working
            .add_message(owner, MessageRole::User, text, importance, None)?;
        let activated_tools = self.tools.auto_activate_tools(owner, text)?;
        let messages = self.recent_turns(owner);
        let context = self.format_context(owner, Some(text), &messages)?;

        debug!(
            owner,
            activated = activated_tools.len(),
            expired = expired_tools.len(),
            "Processed user message"
        );
        Ok(TurnContext {
            context,
            messages,
            activated_tools,
            expired_tools,
        })
    }

    /// Record the assistant's reply and the tools it used.
    pub fn process_assistant_response(
        &self,
        owner: &str,
        text: &str,
        tools_used: &[String],
    ) -> Result<()> {
        self.working.add_message(
            owner,
            MessageRole::Assistant,
            text,
            ASSISTANT_IMPORTANCE,
            None,
        )?;
        for tool in tools_used {
            self.tools.record_tool_use(owner, tool)?;
        }
        Ok(())
    }

    /// Store an explicit long-term memory.
    pub fn remember(
        &self,
        owner: &str,
        content: &str,
        options: CreateMemoryOptions,
    ) -> Result<Memory> {
        self.store.create_memory(owner, content, options)
    }

    pub fn forget(&self, memory_id: &str) -> Result<bool> {
        self.store.forget_memory(memory_id)
    }

    pub fn recall(&self, owner: &str, query: &str, limit: usize) -> Result<Vec<Memory>> {
        self.store
            .search_memories(owner, query, SearchOptions::with_limit(limit))
    }

    /// Recent turns, memory context, tool context and the working-memory
    /// summary line as one prompt-injectable block.
    pub fn get_formatted_context(&self, owner: &str, text: Option<&str>) -> Result<String> {
        let messages = self.recent_turns(owner);
        self.format_context(owner, text, &messages)
    }

    fn recent_turns(&self, owner: &str) -> Vec<WorkingMessage> {
        self.working
            .get_context_messages(owner, self.config.working.context_token_budget)
    }

    fn format_context(
        &self,
        owner: &str,
        text: Option<&str>,
        messages: &[WorkingMessage],
    ) -> Result<String> {
        let mut sections = Vec::new();

        let recent = working::render::render_recent_turns(messages);
        if !recent.is_empty() {
            sections.push(recent.trim_end().to_string());
        }
        let memory_context = self.working.get_memory_context(owner, text)?;
        if !memory_context.is_empty() {
            sections.push(memory_context.trim_end().to_string());
        }
        sections.push(self.tools.tool_context(owner)?.trim_end().to_string());
        sections.push(self.working.summary_line(owner));

        Ok(sections.join("\n\n"))
    }
}
