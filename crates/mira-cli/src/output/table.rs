use anyhow::Result;
use comfy_table::{Cell, Table};
use mira_core::Memory;

use crate::commands::utils::{format_strength, format_timestamp, preview_text};

pub fn print_table(table: Table) -> Result<()> {
    println!("{table}");
    Ok(())
}

/// Memory list with live strength and rank.
pub fn memory_table(memories: &[Memory]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Type", "Strength", "Importance", "Last Access", "Tags", "Preview",
    ]);

    for memory in memories {
        table.add_row(vec![
            Cell::new(memory.id.clone()),
            Cell::new(memory.memory_type),
            Cell::new(format_strength(memory.strength)),
            Cell::new(format!("{:.2}", memory.importance)),
            Cell::new(format_timestamp(Some(memory.last_accessed))),
            Cell::new(memory.tags.iter().cloned().collect::<Vec<_>>().join(", ")),
            Cell::new(preview_text(&memory.content, 60)),
        ]);
    }
    table
}
