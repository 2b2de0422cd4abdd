//! Memory Store - durable, decaying long-term memory.
//!
//! Every strength returned from this module is a live value projected from
//! the stored checkpoint. Reads below the forget threshold delete the record
//! and report it as absent.

use super::decay::DecayModel;
use crate::clock::SharedClock;
use crate::config::DecayConfig;
use crate::models::{
    DecayReport, DomainDoc, LinkType, LinkedMemory, Memory, MemoryLink, MemoryStats, MemoryType,
    Metadata,
};
use crate::storage::Storage;
use anyhow::Result;
use tracing::{debug, info};

/// Strength given to links created from `related_ids`.
const RELATED_LINK_STRENGTH: f64 = 0.5;

/// Options for [`MemoryStore::create_memory`].
#[derive(Debug, Clone)]
pub struct CreateMemoryOptions {
    pub memory_type: MemoryType,
    pub importance: f64,
    pub tags: Vec<String>,
    pub metadata: Metadata,
    pub related_ids: Vec<String>,
}

impl Default for CreateMemoryOptions {
    fn default() -> Self {
        Self {
            memory_type: MemoryType::Episodic,
            importance: 0.5,
            tags: Vec::new(),
            metadata: Metadata::new(),
            related_ids: Vec::new(),
        }
    }
}

impl CreateMemoryOptions {
    pub fn new(memory_type: MemoryType, importance: f64) -> Self {
        Self {
            memory_type,
            importance,
            ..Self::default()
        }
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

    #[must_use]
    pub fn with_related(mut self, related_ids: Vec<String>) -> Self {
        self.related_ids = related_ids;
        self
    }
}

/// Options for [`MemoryStore::search_memories`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    /// Raised to the type's forget threshold when lower
    pub min_strength: f64,
    /// Empty means all types
    pub types: Vec<MemoryType>,
    /// A result must carry every tag listed
    pub tags: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            min_strength: 0.0,
            types: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Durable long-term memory with lazy forgetting.
#[derive(Clone)]
pub struct MemoryStore {
    storage: Storage,
    clock: SharedClock,
    decay: DecayModel,
}

impl MemoryStore {
    pub fn new(storage: Storage, clock: SharedClock, config: DecayConfig) -> Self {
        Self {
            storage,
            clock,
            decay: DecayModel::new(config),
        }
    }

    pub fn decay(&self) -> &DecayModel {
        &self.decay
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // ============== Memory Operations ==============

    /// Create a memory at full strength and link it to each related id.
    pub fn create_memory(
        &self,
        owner: &str,
        content: &str,
        options: CreateMemoryOptions,
    ) -> Result<Memory> {
        let now = self.now_ms();
        let mut memory = Memory::new(
            owner.to_string(),
            content.to_string(),
            options.memory_type,
            now,
        )
        .with_importance(options.importance)
        .with_tags(options.tags)
        .with_metadata(options.metadata);
        memory.related_ids = options.related_ids.into_iter().collect();

        self.storage.memories.save(&memory)?;

        for related_id in &memory.related_ids {
            if !self.link_memories(&memory.id, related_id, LinkType::Related, RELATED_LINK_STRENGTH)? {
                debug!(memory_id = %memory.id, related_id = %related_id, "Related memory missing, link skipped");
            }
        }

        debug!(
            owner,
            memory_id = %memory.id,
            memory_type = %memory.memory_type,
            "Created memory"
        );
        Ok(memory)
    }

    /// Read a memory through its decay projection.
    ///
    /// Returns `None` (and deletes the record) once the live strength is below
    /// the forget threshold. With `boost`, the access is recorded and the
    /// boosted strength returned.
    pub fn get_memory(&self, id: &str, boost: bool) -> Result<Option<Memory>> {
        let Some(mut memory) = self.storage.memories.get(id)? else {
            return Ok(None);
        };

        let now = self.now_ms();
        let live = self.decay.live_strength(&memory, now);
        if self.decay.is_forgotten(live, memory.memory_type) {
            self.forget_memory(id)?;
            debug!(memory_id = id, live, "Memory forgotten on read");
            return Ok(None);
        }

        if boost {
            memory.strength = self.decay.boost(live, memory.memory_type);
            memory.strength_checkpointed_at = now;
            memory.last_accessed = now;
            memory.access_count += 1;
            self.storage.memories.save(&memory)?;
        } else {
            memory.strength = live;
        }

        Ok(Some(memory))
    }

    /// Live view of every reachable memory of an owner.
    fn live_memories(&self, owner: &str) -> Result<Vec<Memory>> {
        let now = self.now_ms();
        Ok(self
            .storage
            .memories
            .list_by_owner(owner)?
            .into_iter()
            .filter_map(|mut memory| {
                let live = self.decay.live_strength(&memory, now);
                if self.decay.is_forgotten(live, memory.memory_type) {
                    return None;
                }
                memory.strength = live;
                Some(memory)
            })
            .collect())
    }

    /// Substring search ranked by `strength * importance`.
    pub fn search_memories(
        &self,
        owner: &str,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<Memory>> {
        let needle = query.trim().to_lowercase();

        let mut matches: Vec<Memory> = self
            .live_memories(owner)?
            .into_iter()
            .filter(|m| options.types.is_empty() || options.types.contains(&m.memory_type))
            .filter(|m| needle.is_empty() || m.content.to_lowercase().contains(&needle))
            .filter(|m| m.strength >= options.min_strength)
            .filter(|m| options.tags.iter().all(|tag| m.has_tag(tag)))
            .collect();

        sort_by_rank(&mut matches);
        matches.truncate(options.limit);
        Ok(matches)
    }

    /// Most recently accessed memories above `min_strength`.
    pub fn get_recent_memories(
        &self,
        owner: &str,
        limit: usize,
        min_strength: f64,
    ) -> Result<Vec<Memory>> {
        let mut memories: Vec<Memory> = self
            .live_memories(owner)?
            .into_iter()
            .filter(|m| m.strength >= min_strength)
            .collect();

        memories.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        memories.truncate(limit);
        Ok(memories)
    }

    /// Highest `strength * importance` memories still above the forget threshold.
    pub fn get_strongest_memories(&self, owner: &str, limit: usize) -> Result<Vec<Memory>> {
        let mut memories = self.live_memories(owner)?;
        sort_by_rank(&mut memories);
        memories.truncate(limit);
        Ok(memories)
    }

    /// Hard delete plus link cascade. Returns whether the memory existed.
    pub fn forget_memory(&self, id: &str) -> Result<bool> {
        let links = self.storage.links.delete_for_memory(id)?;
        let existed = self.storage.memories.delete(id)?;
        if existed {
            debug!(memory_id = id, links, "Forgot memory");
        }
        Ok(existed)
    }

    // ============== Link Operations ==============

    /// Upsert a link. Returns false when either endpoint does not exist.
    pub fn link_memories(
        &self,
        source: &str,
        target: &str,
        link_type: LinkType,
        strength: f64,
    ) -> Result<bool> {
        if source == target
            || self.storage.memories.get(source)?.is_none()
            || self.storage.memories.get(target)?.is_none()
        {
            return Ok(false);
        }

        let created_at = self
            .storage
            .links
            .get(source, target)?
            .map(|existing| existing.created_at)
            .unwrap_or_else(|| self.now_ms());

        self.storage.links.upsert(&MemoryLink {
            source: source.to_string(),
            target: target.to_string(),
            link_type,
            strength: strength.clamp(0.0, 1.0),
            created_at,
        })?;
        Ok(true)
    }

    /// The link between two memories in either direction, if any.
    pub fn get_link(&self, a: &str, b: &str) -> Result<Option<MemoryLink>> {
        match self.storage.links.get(a, b)? {
            Some(link) => Ok(Some(link)),
            None => self.storage.links.get(b, a),
        }
    }

    /// Memories linked to `id` in either direction, each with its own live strength.
    pub fn get_linked_memories(
        &self,
        id: &str,
        link_type: Option<LinkType>,
    ) -> Result<Vec<LinkedMemory>> {
        let mut linked = Vec::new();
        for link in self.storage.links.list_for(id)? {
            if link_type.is_some_and(|t| t != link.link_type) {
                continue;
            }
            // The other end may have been forgotten since the link was listed
            if let Some(memory) = self.get_memory(link.other_end(id), false)? {
                linked.push(LinkedMemory {
                    live_strength: memory.strength,
                    memory,
                    link,
                });
            }
        }
        linked.sort_by(|a, b| b.live_strength.total_cmp(&a.live_strength));
        Ok(linked)
    }

    // ============== Domain Docs ==============

    /// Create or update the document identified by (owner, title).
    pub fn set_domain_doc(&self, owner: &str, title: &str, content: &str) -> Result<DomainDoc> {
        let now = self.now_ms();
        let mut doc = DomainDoc::new(owner.to_string(), title.to_string(), content.to_string(), now);
        if let Some(existing) = self.storage.domain_docs.get(&doc.id)? {
            doc.created_at = existing.created_at;
        }
        self.storage.domain_docs.save(&doc)?;
        Ok(doc)
    }

    pub fn get_domain_docs(&self, owner: &str) -> Result<Vec<DomainDoc>> {
        self.storage.domain_docs.list_by_owner(owner)
    }

    pub fn get_domain_doc(&self, id: &str) -> Result<Option<DomainDoc>> {
        self.storage.domain_docs.get(id)
    }

    pub fn delete_domain_doc(&self, id: &str) -> Result<bool> {
        self.storage.domain_docs.delete(id)
    }

    // ============== Maintenance ==============

    /// Delete every memory below its forget threshold and checkpoint the rest.
    pub fn run_decay_cycle(&self) -> Result<DecayReport> {
        let now = self.now_ms();
        let mut report = DecayReport::default();

        // Live strength never exceeds the checkpoint, so these are gone for any type
        let floor = self.decay.config().min_forget_threshold();
        for id in self.storage.memories.list_ids_below_strength(floor)? {
            report.scanned += 1;
            if self.forget_memory(&id)? {
                report.pruned += 1;
            }
        }

        for mut memory in self.storage.memories.list_all()? {
            report.scanned += 1;
            let live = self.decay.live_strength(&memory, now);
            if self.decay.is_forgotten(live, memory.memory_type) {
                if self.forget_memory(&memory.id)? {
                    report.pruned += 1;
                }
                continue;
            }

            if memory.strength_checkpointed_at != now {
                memory.strength = live;
                memory.strength_checkpointed_at = now;
                self.storage.memories.save(&memory)?;
            }
            report.checkpointed += 1;
        }

        info!(
            scanned = report.scanned,
            pruned = report.pruned,
            checkpointed = report.checkpointed,
            "Memory decay cycle complete"
        );
        Ok(report)
    }

    /// Count, per-type breakdown, mean live strength and age range.
    pub fn get_memory_stats(&self, owner: &str) -> Result<MemoryStats> {
        let memories = self.live_memories(owner)?;
        let mut stats = MemoryStats::default();

        for memory in &memories {
            stats.total += 1;
            match memory.memory_type {
                MemoryType::Episodic => stats.episodic += 1,
                MemoryType::Semantic => stats.semantic += 1,
                MemoryType::Procedural => stats.procedural += 1,
            }
            stats.oldest = Some(stats.oldest.map_or(memory.created_at, |t| t.min(memory.created_at)));
            stats.newest = Some(stats.newest.map_or(memory.created_at, |t| t.max(memory.created_at)));
        }

        if !memories.is_empty() {
            stats.average_strength =
                memories.iter().map(|m| m.strength).sum::<f64>() / memories.len() as f64;
        }
        Ok(stats)
    }

    /// Owners that currently have stored memories.
    pub fn list_owners(&self) -> Result<Vec<String>> {
        self.storage.memories.list_owners()
    }

    /// Whether a memory with `tag` exists for `owner`.
    pub fn has_tagged_memory(&self, owner: &str, tag: &str) -> Result<bool> {
        Ok(self.live_memories(owner)?.iter().any(|m| m.has_tag(tag)))
    }
}

fn rank(memory: &Memory) -> f64 {
    memory.strength * memory.importance
}

fn sort_by_rank(memories: &mut [Memory]) {
    memories.sort_by(|a, b| {
        rank(b)
            .total_cmp(&rank(a))
            .then_with(|| b.last_accessed.cmp(&a.last_accessed))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        clock: Arc<ManualClock>,
        store: MemoryStore,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("mira.db")).unwrap();
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = MemoryStore::new(storage, clock.clone(), DecayConfig::default());
        Fixture {
            _dir: dir,
            clock,
            store,
        }
    }

    fn episodic(importance: f64) -> CreateMemoryOptions {
        CreateMemoryOptions::new(MemoryType::Episodic, importance)
    }

    #[test]
    fn test_create_memory_defaults() {
        let f = fixture();
        let memory = f.store.create_memory("u1", "Likes flat whites", episodic(0.7)).unwrap();

        assert_eq!(memory.strength, 1.0);
        assert_eq!(memory.access_count, 1);
        assert_eq!(memory.importance, 0.7);
        assert_eq!(memory.owner, "u1");
    }

    #[test]
    fn test_create_memory_links_related() {
        let f = fixture();
        let first = f.store.create_memory("u1", "Ordered a latte", episodic(0.5)).unwrap();
        let second = f
            .store
            .create_memory(
                "u1",
                "Latte was too hot",
                episodic(0.5).with_related(vec![first.id.clone(), "mem-missing".into()]),
            )
            .unwrap();

        let linked = f.store.get_linked_memories(&first.id, None).unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].memory.id, second.id);
        assert_eq!(linked[0].link.link_type, LinkType::Related);
        assert_eq!(linked[0].link.strength, 0.5);
    }

    #[test]
    fn test_get_memory_boosts_from_live_strength() {
        let f = fixture();
        let memory = f.store.create_memory("u1", "Cold brew", episodic(0.5)).unwrap();

        f.clock.advance_days(7.0);
        let peeked = f.store.get_memory(&memory.id, false).unwrap().unwrap();
        assert!((peeked.strength - 0.5).abs() < 1e-9);
        assert_eq!(peeked.access_count, 1);

        let boosted = f.store.get_memory(&memory.id, true).unwrap().unwrap();
        assert!((boosted.strength - 0.7).abs() < 1e-9);
        assert_eq!(boosted.access_count, 2);
        assert_eq!(boosted.last_accessed, f.clock.now_ms());

        // Checkpoint moved to now, so no further decay yet
        let again = f.store.get_memory(&memory.id, false).unwrap().unwrap();
        assert!((again.strength - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_lazy_forgetting_after_horizon() {
        let f = fixture();
        let memory = f.store.create_memory("u1", "Dentist on Friday", episodic(0.9)).unwrap();

        f.clock.advance_days(23.0);
        assert!(f.store.get_memory(&memory.id, false).unwrap().is_some());

        f.clock.advance_days(0.5);
        assert!(f.store.search_memories("u1", "dentist", SearchOptions::default()).unwrap().is_empty());
        assert!(f.store.get_memory(&memory.id, true).unwrap().is_none());
        assert_eq!(f.store.storage.memories.count().unwrap(), 0);
    }

    #[test]
    fn test_search_filters_and_ranks() {
        let f = fixture();
        f.store
            .create_memory("u1", "Coffee at noon", episodic(0.3).with_tags(["coffee"]))
            .unwrap();
        f.store
            .create_memory("u1", "COFFEE beans from Kenya", episodic(0.9).with_tags(["coffee", "shopping"]))
            .unwrap();
        f.store.create_memory("u1", "Tea time", episodic(1.0)).unwrap();
        f.store.create_memory("u2", "coffee elsewhere", episodic(1.0)).unwrap();

        let results = f.store.search_memories("u1", "coffee", SearchOptions::default()).unwrap();
        let contents: Vec<&str> = results.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["COFFEE beans from Kenya", "Coffee at noon"]);

        let tagged = f
            .store
            .search_memories("u1", "coffee", SearchOptions::default().tagged("shopping"))
            .unwrap();
        assert_eq!(tagged.len(), 1);

        let limited = f.store.search_memories("u1", "", SearchOptions::with_limit(1)).unwrap();
        assert_eq!(limited[0].content, "Tea time");

        let semantic_only = f
            .store
            .search_memories(
                "u1",
                "coffee",
                SearchOptions {
                    types: vec![MemoryType::Semantic],
                    ..SearchOptions::default()
                },
            )
            .unwrap();
        assert!(semantic_only.is_empty());
    }

    #[test]
    fn test_search_min_strength() {
        let f = fixture();
        f.store.create_memory("u1", "old espresso", episodic(0.5)).unwrap();
        f.clock.advance_days(7.0);
        f.store.create_memory("u1", "new espresso", episodic(0.5)).unwrap();

        let strong = f
            .store
            .search_memories(
                "u1",
                "espresso",
                SearchOptions {
                    min_strength: 0.6,
                    ..SearchOptions::default()
                },
            )
            .unwrap();
        assert_eq!(strong.len(), 1);
        assert_eq!(strong[0].content, "new espresso");
    }

    #[test]
    fn test_recent_memories_by_access() {
        let f = fixture();
        let first = f.store.create_memory("u1", "first", episodic(0.5)).unwrap();
        f.clock.advance_ms(1_000);
        f.store.create_memory("u1", "second", episodic(0.5)).unwrap();
        f.clock.advance_ms(1_000);
        f.store.get_memory(&first.id, true).unwrap();

        let recent = f.store.get_recent_memories("u1", 10, 0.0).unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(f.store.get_recent_memories("u1", 1, 0.0).unwrap().len(), 1);
    }

    #[test]
    fn test_forget_cascades_links() {
        let f = fixture();
        let a = f.store.create_memory("u1", "a", episodic(0.5)).unwrap();
        let b = f.store.create_memory("u1", "b", episodic(0.5)).unwrap();
        let c = f.store.create_memory("u1", "c", episodic(0.5)).unwrap();
        f.store.link_memories(&a.id, &b.id, LinkType::LeadsTo, 0.8).unwrap();
        f.store.link_memories(&c.id, &a.id, LinkType::CausedBy, 0.4).unwrap();
        f.store.link_memories(&b.id, &c.id, LinkType::Related, 0.4).unwrap();

        assert!(f.store.forget_memory(&a.id).unwrap());
        assert!(!f.store.forget_memory(&a.id).unwrap());
        assert_eq!(f.store.storage.links.count().unwrap(), 1);
        assert!(f.store.get_memory(&a.id, false).unwrap().is_none());
    }

    #[test]
    fn test_link_memories_is_idempotent_upsert() {
        let f = fixture();
        let a = f.store.create_memory("u1", "a", episodic(0.5)).unwrap();
        let b = f.store.create_memory("u1", "b", episodic(0.5)).unwrap();

        assert!(f.store.link_memories(&a.id, &b.id, LinkType::Related, 0.3).unwrap());
        f.clock.advance_ms(5_000);
        assert!(f.store.link_memories(&a.id, &b.id, LinkType::Contradicts, 0.9).unwrap());
        assert!(!f.store.link_memories(&a.id, "mem-missing", LinkType::Related, 0.3).unwrap());

        assert_eq!(f.store.storage.links.count().unwrap(), 1);
        let linked = f.store.get_linked_memories(&b.id, Some(LinkType::Contradicts)).unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].link.strength, 0.9);
        assert!(linked[0].link.created_at < f.clock.now_ms());
        assert!(f.store.get_linked_memories(&b.id, Some(LinkType::Related)).unwrap().is_empty());
    }

    #[test]
    fn test_linked_memories_report_own_strength() {
        let f = fixture();
        let semantic = f
            .store
            .create_memory("u1", "fact", CreateMemoryOptions::new(MemoryType::Semantic, 0.5))
            .unwrap();
        let event = f.store.create_memory("u1", "event", episodic(0.5)).unwrap();
        f.store.link_memories(&event.id, &semantic.id, LinkType::Related, 0.5).unwrap();

        f.clock.advance_days(7.0);
        let linked = f.store.get_linked_memories(&event.id, None).unwrap();
        let expected = 0.5f64.powf(7.0 / 30.0);
        assert!((linked[0].live_strength - expected).abs() < 1e-9);
    }

    #[test]
    fn test_domain_docs_update_in_place() {
        let f = fixture();
        let first = f.store.set_domain_doc("u1", "Menu", "espresso 2.50").unwrap();
        f.clock.advance_ms(10_000);
        let second = f.store.set_domain_doc("u1", "Menu", "espresso 2.80").unwrap();
        f.store.set_domain_doc("u1", "Hours", "7-19").unwrap();
        f.store.set_domain_doc("u2", "Menu", "other").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);

        let docs = f.store.get_domain_docs("u1").unwrap();
        let titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Hours", "Menu"]);
        assert_eq!(f.store.get_domain_doc(&first.id).unwrap().unwrap().content, "espresso 2.80");

        // Docs never decay
        f.clock.advance_days(365.0);
        f.store.run_decay_cycle().unwrap();
        assert!(f.store.delete_domain_doc(&first.id).unwrap());
        assert!(!f.store.delete_domain_doc(&first.id).unwrap());
        assert_eq!(f.store.get_domain_docs("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_decay_cycle_prunes_and_is_idempotent() {
        let f = fixture();
        let episodic_memory = f.store.create_memory("u1", "event", episodic(0.5)).unwrap();
        let semantic = f
            .store
            .create_memory("u1", "fact", CreateMemoryOptions::new(MemoryType::Semantic, 0.5))
            .unwrap();
        let procedural = f
            .store
            .create_memory("u1", "skill", CreateMemoryOptions::new(MemoryType::Procedural, 0.5))
            .unwrap();

        f.clock.advance_days(30.0);
        let first = f.store.run_decay_cycle().unwrap();
        assert_eq!(first.pruned, 1);
        assert_eq!(first.checkpointed, 2);
        assert!(f.store.get_memory(&episodic_memory.id, false).unwrap().is_none());

        let snapshot: Vec<Memory> = f.store.storage.memories.list_all().unwrap();
        let second = f.store.run_decay_cycle().unwrap();
        assert_eq!(second.pruned, 0);
        assert_eq!(second.checkpointed, 2);
        assert_eq!(f.store.storage.memories.list_all().unwrap(), snapshot);

        let semantic_live = f.store.get_memory(&semantic.id, false).unwrap().unwrap();
        assert!((semantic_live.strength - 0.5).abs() < 1e-9);
        let procedural_live = f.store.get_memory(&procedural.id, false).unwrap().unwrap();
        assert!((procedural_live.strength - 0.5f64.powf(30.0 / 90.0)).abs() < 1e-9);
    }

    #[test]
    fn test_decay_cycle_checkpoint_preserves_curve() {
        let f = fixture();
        let memory = f
            .store
            .create_memory("u1", "fact", CreateMemoryOptions::new(MemoryType::Semantic, 0.5))
            .unwrap();

        f.clock.advance_days(10.0);
        f.store.run_decay_cycle().unwrap();
        f.clock.advance_days(20.0);

        let live = f.store.get_memory(&memory.id, false).unwrap().unwrap();
        assert!((live.strength - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_memory_stats() {
        let f = fixture();
        assert_eq!(f.store.get_memory_stats("u1").unwrap(), MemoryStats::default());

        f.store.create_memory("u1", "a", episodic(0.5)).unwrap();
        f.clock.advance_days(7.0);
        f.store
            .create_memory("u1", "b", CreateMemoryOptions::new(MemoryType::Procedural, 0.5))
            .unwrap();

        let stats = f.store.get_memory_stats("u1").unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.episodic, 1);
        assert_eq!(stats.procedural, 1);
        assert_eq!(stats.semantic, 0);
        assert!((stats.average_strength - 0.75).abs() < 1e-9);
        assert!(stats.oldest.unwrap() < stats.newest.unwrap());
    }
}
