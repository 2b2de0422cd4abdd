use anyhow::{Result, bail};
use colored::Colorize;
use comfy_table::{Cell, Table};
use mira_core::{LinkType, LinkedMemory, Mira};
use serde_json::json;

use crate::cli::LinkArgs;
use crate::commands::utils::{format_strength, preview_text};
use crate::output::table::print_table;
use crate::output::{OutputFormat, json::print_json};

pub fn link(mira: &Mira, args: LinkArgs, format: OutputFormat) -> Result<()> {
    let link_type: LinkType = args.link_type.parse()?;
    if !(0.0..=1.0).contains(&args.strength) {
        bail!("Link strength must be between 0 and 1, got {}", args.strength);
    }

    let linked = mira
        .store()
        .link_memories(&args.source, &args.target, link_type, args.strength)?;

    if format.is_json() {
        return print_json(&json!({
            "source": args.source,
            "target": args.target,
            "type": link_type,
            "linked": linked
        }));
    }

    if !linked {
        bail!(
            "Cannot link {} -> {}: memory not found or same memory",
            args.source,
            args.target
        );
    }
    println!(
        "{} {} -[{}]-> {}",
        "Linked".green().bold(),
        args.source,
        link_type,
        args.target
    );
    Ok(())
}

pub fn links(mira: &Mira, id: &str, link_type: Option<String>, format: OutputFormat) -> Result<()> {
    let link_type = link_type.map(|t| t.parse::<LinkType>()).transpose()?;
    let linked = mira.store().get_linked_memories(id, link_type)?;

    if format.is_json() {
        return print_json(&linked);
    }

    if linked.is_empty() {
        println!("No linked memories.");
        return Ok(());
    }
    print_table(linked_table(id, &linked))
}

fn linked_table(id: &str, linked: &[LinkedMemory]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Direction", "Type", "Link", "ID", "Strength", "Preview"]);

    for entry in linked {
        let direction = if entry.link.source == id { "out" } else { "in" };
        table.add_row(vec![
            Cell::new(direction),
            Cell::new(entry.link.link_type),
            Cell::new(format!("{:.2}", entry.link.strength)),
            Cell::new(entry.memory.id.clone()),
            Cell::new(format_strength(entry.live_strength)),
            Cell::new(preview_text(&entry.memory.content, 60)),
        ]);
    }
    table
}
