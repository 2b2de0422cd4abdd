//! Tool Registry - which tools are active per conversation.
//!
//! On-demand tools switch on when their trigger keywords appear and switch
//! off after `ttl_turns` turns without use. `advance_turn` must run exactly
//! once per conversational turn for the TTL to mean what it says.

use crate::clock::SharedClock;
use crate::config::ToolsConfig;
use crate::models::{ActiveTool, CoOccurrence, ToolDefinition, ToolState};
use crate::session::SessionStore;
use crate::storage::ToolStateStorage;
use anyhow::Result;
use tracing::{debug, info, warn};

pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    storage: ToolStateStorage,
    clock: SharedClock,
    config: ToolsConfig,
    /// Serializes read-modify-write of one conversation's tool state
    owner_locks: SessionStore<()>,
}

impl ToolRegistry {
    pub fn new(
        definitions: Vec<ToolDefinition>,
        storage: ToolStateStorage,
        clock: SharedClock,
        config: ToolsConfig,
    ) -> Self {
        Self {
            definitions,
            storage,
            clock,
            config,
            owner_locks: SessionStore::new(),
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    fn is_always_active(&self, name: &str) -> bool {
        self.definition(name).is_some_and(|d| d.always_active)
    }

    fn load_state(&self, owner: &str, name: &str) -> Result<ToolState> {
        Ok(self
            .storage
            .get(owner, name)?
            .unwrap_or_else(|| ToolState::new(owner, name)))
    }

    /// On-demand tools whose trigger keywords occur in `text`.
    pub fn detect_needed_tools(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        self.definitions
            .iter()
            .filter(|d| !d.always_active)
            .filter(|d| d.triggers.iter().any(|t| text.contains(t.as_str())))
            .map(|d| d.name.clone())
            .collect()
    }

    /// Activate every tool detected in `text`.
    ///
    /// Returns only the tools that were inactive before this call.
    pub fn auto_activate_tools(&self, owner: &str, text: &str) -> Result<Vec<String>> {
        let mut activated = Vec::new();
        for name in self.detect_needed_tools(text) {
            if self.activate_tool(owner, &name)? {
                activated.push(name);
            }
        }
        if !activated.is_empty() {
            info!(owner, tools = ?activated, "Auto-activated tools");
        }
        Ok(activated)
    }

    /// Turn a tool on, or refresh its idle counter if already on.
    ///
    /// Returns true when the tool transitioned from inactive to active.
    pub fn activate_tool(&self, owner: &str, name: &str) -> Result<bool> {
        let Some(definition) = self.definition(name) else {
            warn!(owner, tool = name, "Cannot activate unknown tool");
            return Ok(false);
        };
        if definition.always_active {
            return Ok(false);
        }

        let (lock, _) = self.owner_locks.get_or_create(owner, || ());
        let _guard = lock.lock();

        let now = self.clock.now_ms();
        let mut state = self.load_state(owner, name)?;
        let newly_active = !state.enabled;
        if newly_active {
            state.enabled = true;
            state.activated_at = Some(now);
            state.use_count = 0;
        }
        state.turns_since_use = 0;
        self.storage.save(&state)?;

        if newly_active {
            debug!(owner, tool = name, "Activated tool");
        }
        Ok(newly_active)
    }

    /// Turn a tool off. Always-active tools cannot be turned off.
    pub fn deactivate_tool(&self, owner: &str, name: &str) -> Result<bool> {
        if self.is_always_active(name) {
            return Ok(false);
        }

        let (lock, _) = self.owner_locks.get_or_create(owner, || ());
        let _guard = lock.lock();

        let Some(mut state) = self.storage.get(owner, name)? else {
            return Ok(false);
        };
        if !state.enabled {
            return Ok(false);
        }
        state.enabled = false;
        self.storage.save(&state)?;
        debug!(owner, tool = name, "Deactivated tool");
        Ok(true)
    }

    /// Record a use: bump counters, reset the idle counter and count
    /// co-occurrence with every other active on-demand tool.
    pub fn record_tool_use(&self, owner: &str, name: &str) -> Result<bool> {
        let Some(definition) = self.definition(name) else {
            warn!(owner, tool = name, "Ignoring use of unknown tool");
            return Ok(false);
        };
        let always_active = definition.always_active;

        let (lock, _) = self.owner_locks.get_or_create(owner, || ());
        let _guard = lock.lock();

        let now = self.clock.now_ms();
        let mut state = self.load_state(owner, name)?;
        if !always_active && !state.enabled {
            state.enabled = true;
            state.activated_at = Some(now);
            state.use_count = 0;
        }
        state.total_uses += 1;
        state.use_count += 1;
        state.last_used_at = Some(now);
        state.turns_since_use = 0;
        self.storage.save(&state)?;

        for other in self.storage.list_for_owner(owner)? {
            if other.tool_name != name && other.enabled && !self.is_always_active(&other.tool_name) {
                self.storage
                    .increment_cooccurrence(owner, name, &other.tool_name)?;
            }
        }
        Ok(true)
    }

    /// Count one turn for every active tool and expire those past the TTL.
    ///
    /// Returns the names of tools deactivated by this turn.
    pub fn advance_turn(&self, owner: &str) -> Result<Vec<String>> {
        let (lock, _) = self.owner_locks.get_or_create(owner, || ());
        let _guard = lock.lock();

        let mut expired = Vec::new();
        for mut state in self.storage.list_for_owner(owner)? {
            if !state.enabled || self.is_always_active(&state.tool_name) {
                continue;
            }
            state.turns_since_use += 1;
            if state.turns_since_use > self.config.ttl_turns {
                state.enabled = false;
                expired.push(state.tool_name.clone());
            }
            self.storage.save(&state)?;
        }

        if !expired.is_empty() {
            info!(owner, tools = ?expired, "Tools expired after idle turns");
        }
        Ok(expired)
    }

    /// Expiry sweep across every conversation.
    ///
    /// Applies the same turn TTL as `advance_turn`; wall-clock idle time never
    /// expires a tool. Returns (owner, tool) pairs.
    pub fn deactivate_expired_tools(&self) -> Result<Vec<(String, String)>> {
        let mut expired = Vec::new();

        for state in self.storage.list_all()? {
            if !state.enabled || self.is_always_active(&state.tool_name) {
                continue;
            }

            let (lock, _) = self.owner_locks.get_or_create(&state.owner, || ());
            let _guard = lock.lock();

            // Re-read under the lock, a turn may have refreshed it
            let Some(mut state) = self.storage.get(&state.owner, &state.tool_name)? else {
                continue;
            };
            if state.enabled && state.turns_since_use > self.config.ttl_turns {
                state.enabled = false;
                self.storage.save(&state)?;
                expired.push((state.owner.clone(), state.tool_name.clone()));
            }
        }

        info!(count = expired.len(), "Tool expiry sweep complete");
        Ok(expired)
    }

    /// Pairs involving `tool` in this conversation, highest count first.
    pub fn cooccurrences(&self, owner: &str, tool: &str) -> Result<Vec<CoOccurrence>> {
        self.storage.cooccurrences_for(owner, tool)
    }

    /// Tools most often used together with `current_tool`.
    pub fn get_suggested_tools(&self, owner: &str, current_tool: &str) -> Result<Vec<String>> {
        Ok(self
            .cooccurrences(owner, current_tool)?
            .into_iter()
            .filter(|pair| self.definition(&pair.tool_b).is_some())
            .take(self.config.max_suggestions)
            .map(|pair| pair.tool_b)
            .collect())
    }

    /// Always-active tools, then enabled on-demand tools by use count.
    ///
    /// The total is capped at the active-tool maximum, but never below the
    /// number of always-active tools.
    pub fn get_active_tools(&self, owner: &str) -> Result<Vec<ActiveTool>> {
        let states = self.storage.list_for_owner(owner)?;
        let uses_of = |name: &str| {
            states
                .iter()
                .find(|s| s.tool_name == name)
                .map(|s| (s.use_count, s.total_uses))
                .unwrap_or((0, 0))
        };

        let mut active: Vec<ActiveTool> = self
            .definitions
            .iter()
            .filter(|d| d.always_active)
            .map(|d| {
                let (use_count, total_uses) = uses_of(&d.name);
                ActiveTool {
                    definition: d.clone(),
                    use_count,
                    total_uses,
                }
            })
            .collect();
        let cap = self.config.max_active_tools.max(active.len());

        let mut on_demand: Vec<ActiveTool> = states
            .iter()
            .filter(|s| s.enabled)
            .filter_map(|s| {
                let definition = self.definition(&s.tool_name)?;
                (!definition.always_active).then(|| ActiveTool {
                    definition: definition.clone(),
                    use_count: s.use_count,
                    total_uses: s.total_uses,
                })
            })
            .collect();
        on_demand.sort_by(|a, b| {
            b.use_count
                .cmp(&a.use_count)
                .then_with(|| b.total_uses.cmp(&a.total_uses))
                .then_with(|| a.definition.name.cmp(&b.definition.name))
        });

        active.extend(on_demand);
        active.truncate(cap);
        Ok(active)
    }

    /// Active tool list rendered for prompt injection.
    pub fn tool_context(&self, owner: &str) -> Result<String> {
        let mut context = String::from("Active tools:\n");
        for tool in self.get_active_tools(owner)? {
            context.push_str(&format!(
                "- {}: {}\n",
                tool.definition.name, tool.definition.description
            ));
        }
        Ok(context)
    }

    /// Stored state of every tool this conversation has touched.
    pub fn tool_states(&self, owner: &str) -> Result<Vec<ToolState>> {
        self.storage.list_for_owner(owner)
    }
}
