use anyhow::{Result, bail};
use colored::Colorize;
use mira_core::memory::CreateMemoryOptions;
use mira_core::{Memory, MemoryType, Mira};
use serde_json::json;

use crate::cli::RememberArgs;
use crate::commands::utils::{format_strength, format_timestamp};
use crate::output::table::{memory_table, print_table};
use crate::output::{OutputFormat, json::print_json};

pub fn remember(mira: &Mira, args: RememberArgs, format: OutputFormat) -> Result<()> {
    let memory_type: MemoryType = args.memory_type.parse()?;
    if !(0.0..=1.0).contains(&args.importance) {
        bail!("Importance must be between 0 and 1, got {}", args.importance);
    }

    let memory = mira.remember(
        &args.owner,
        &args.content,
        CreateMemoryOptions::new(memory_type, args.importance).with_tags(args.tags),
    )?;

    if format.is_json() {
        return print_json(&memory);
    }

    println!("{} {}", "Remembered".green().bold(), memory.id);
    Ok(())
}

pub fn recall(mira: &Mira, owner: &str, query: &str, limit: usize, format: OutputFormat) -> Result<()> {
    let memories = mira.recall(owner, query, limit)?;
    print_memories(&memories, format)
}

pub fn forget(mira: &Mira, id: &str, format: OutputFormat) -> Result<()> {
    let existed = mira.forget(id)?;

    if format.is_json() {
        return print_json(&json!({ "id": id, "deleted": existed }));
    }

    if !existed {
        bail!("Memory not found: {}", id);
    }
    println!("{} {}", "Forgot".green().bold(), id);
    Ok(())
}

pub fn show(mira: &Mira, id: &str, boost: bool, format: OutputFormat) -> Result<()> {
    let Some(memory) = mira.store().get_memory(id, boost)? else {
        bail!("Memory not found: {}", id);
    };

    if format.is_json() {
        return print_json(&memory);
    }

    println!("{}", memory.id.bold());
    println!("  Owner:       {}", memory.owner);
    println!("  Type:        {}", memory.memory_type);
    println!("  Strength:    {}", format_strength(memory.strength));
    println!("  Importance:  {:.2}", memory.importance);
    println!("  Accesses:    {}", memory.access_count);
    println!("  Created:     {}", format_timestamp(Some(memory.created_at)));
    println!("  Last access: {}", format_timestamp(Some(memory.last_accessed)));
    if !memory.tags.is_empty() {
        let tags: Vec<&str> = memory.tags.iter().map(String::as_str).collect();
        println!("  Tags:        {}", tags.join(", "));
    }
    if !memory.related_ids.is_empty() {
        let related: Vec<&str> = memory.related_ids.iter().map(String::as_str).collect();
        println!("  Related:     {}", related.join(", "));
    }
    println!();
    println!("{}", memory.content);
    Ok(())
}

pub fn strongest(mira: &Mira, owner: &str, limit: usize, format: OutputFormat) -> Result<()> {
    let memories = mira.store().get_strongest_memories(owner, limit)?;
    print_memories(&memories, format)
}

pub fn recent(
    mira: &Mira,
    owner: &str,
    limit: usize,
    min_strength: f64,
    format: OutputFormat,
) -> Result<()> {
    let memories = mira.store().get_recent_memories(owner, limit, min_strength)?;
    print_memories(&memories, format)
}

pub fn stats(mira: &Mira, owner: &str, format: OutputFormat) -> Result<()> {
    let stats = mira.store().get_memory_stats(owner)?;

    if format.is_json() {
        return print_json(&stats);
    }

    println!("Owner: {}", owner);
    println!("  Total:      {}", stats.total);
    println!("  Episodic:   {}", stats.episodic);
    println!("  Semantic:   {}", stats.semantic);
    println!("  Procedural: {}", stats.procedural);
    println!("  Avg strength: {}", format_strength(stats.average_strength));
    println!("  Oldest:     {}", format_timestamp(stats.oldest));
    println!("  Newest:     {}", format_timestamp(stats.newest));
    Ok(())
}

fn print_memories(memories: &[Memory], format: OutputFormat) -> Result<()> {
    if format.is_json() {
        return print_json(&memories);
    }

    if memories.is_empty() {
        println!("No memories found.");
        return Ok(());
    }
    print_table(memory_table(memories))
}
