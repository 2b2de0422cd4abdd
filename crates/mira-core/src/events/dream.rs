//! Dream consolidation - cross-memory linking and pattern extraction.
//!
//! For each conversation, the strongest memories are compared pairwise by
//! word-set Jaccard similarity; similar pairs get a `related` link. Tags that
//! recur across those memories become a synthetic semantic "pattern" memory.

use crate::config::ConsolidationConfig;
use crate::memory::{CreateMemoryOptions, MemoryStore};
use crate::models::{DreamReport, LinkType, Memory, MemoryType};
use crate::working::buffer::{OVERFLOW_TAG, SUMMARY_TAG};
use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

const PATTERN_TAG: &str = "pattern";
const PATTERN_IMPORTANCE: f64 = 0.7;

/// Lowercased words of at least `min_len` characters.
pub fn significant_words(text: &str, min_len: usize) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= min_len)
        .map(str::to_lowercase)
        .collect()
}

/// |A ∩ B| / |A ∪ B|, zero when both are empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Tag that marks the pattern memory for `tag`.
pub fn pattern_tag(tag: &str) -> String {
    format!("{}:{}", PATTERN_TAG, tag)
}

/// Tags that describe bookkeeping rather than content.
fn is_countable_tag(tag: &str) -> bool {
    !tag.starts_with(PATTERN_TAG) && tag != SUMMARY_TAG && tag != OVERFLOW_TAG
}

/// Run consolidation over every conversation that has memories.
pub fn consolidate(store: &MemoryStore, config: &ConsolidationConfig) -> Result<DreamReport> {
    let mut report = DreamReport::default();

    for owner in store.list_owners()? {
        let memories = store.get_strongest_memories(&owner, config.max_memories)?;
        if memories.len() < config.min_memories.max(2) {
            continue;
        }
        report.owners_scanned += 1;
        report.links_created += link_similar(store, &memories, config)?;
        report.patterns_created += extract_patterns(store, &owner, &memories, config)?;
    }

    info!(
        owners = report.owners_scanned,
        links = report.links_created,
        patterns = report.patterns_created,
        "Dream consolidation complete"
    );
    Ok(report)
}

fn link_similar(
    store: &MemoryStore,
    memories: &[Memory],
    config: &ConsolidationConfig,
) -> Result<usize> {
    let words: Vec<HashSet<String>> = memories
        .iter()
        .map(|m| significant_words(&m.content, config.min_word_len))
        .collect();

    let mut created = 0;
    for i in 0..memories.len() {
        for j in (i + 1)..memories.len() {
            let similarity = jaccard(&words[i], &words[j]);
            if similarity <= config.similarity_threshold {
                continue;
            }
            let (a, b) = (&memories[i].id, &memories[j].id);
            // Keep links that already exist, whatever their type
            if store.get_link(a, b)?.is_some() {
                continue;
            }
            if store.link_memories(a, b, LinkType::Related, similarity)? {
                debug!(source = %a, target = %b, similarity, "Linked similar memories");
                created += 1;
            }
        }
    }
    Ok(created)
}

fn extract_patterns(
    store: &MemoryStore,
    owner: &str,
    memories: &[Memory],
    config: &ConsolidationConfig,
) -> Result<usize> {
    let mut tag_members: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for memory in memories {
        for tag in memory.tags.iter().filter(|t| is_countable_tag(t)) {
            tag_members.entry(tag.as_str()).or_default().push(memory.id.clone());
        }
    }

    let mut created = 0;
    for (tag, members) in tag_members {
        if members.len() < config.pattern_min_count {
            continue;
        }
        let marker = pattern_tag(tag);
        if store.has_tagged_memory(owner, &marker)? {
            continue;
        }

        let content = format!(
            "Recurring theme: {} (seen in {} memories)",
            tag,
            members.len()
        );
        let memory = store.create_memory(
            owner,
            &content,
            CreateMemoryOptions::new(MemoryType::Semantic, PATTERN_IMPORTANCE)
                .with_tags([marker, PATTERN_TAG.to_string()])
                .with_related(members),
        )?;
        info!(owner, tag, memory_id = %memory.id, "Created pattern memory");
        created += 1;
    }
    Ok(created)
}
