use anyhow::Result;
use comfy_table::{Cell, Table};
use mira_core::Mira;
use serde_json::json;

use crate::commands::utils::format_timestamp;
use crate::output::table::print_table;
use crate::output::{OutputFormat, json::print_json};

pub fn run(mira: &Mira, owner: &str, suggest_for: Option<String>, format: OutputFormat) -> Result<()> {
    let active = mira.tools().get_active_tools(owner)?;
    let states = mira.tools().tool_states(owner)?;
    let suggestions = match &suggest_for {
        Some(tool) => mira.tools().get_suggested_tools(owner, tool)?,
        None => Vec::new(),
    };

    if format.is_json() {
        return print_json(&json!({
            "owner": owner,
            "active": active,
            "suggestions": suggestions
        }));
    }

    let mut table = Table::new();
    table.set_header(vec!["Tool", "Category", "Mode", "Uses", "Idle Turns", "Last Used"]);
    for tool in &active {
        let state = states.iter().find(|s| s.tool_name == tool.definition.name);
        let mode = if tool.definition.always_active {
            "always"
        } else {
            "on-demand"
        };
        table.add_row(vec![
            Cell::new(tool.definition.name.clone()),
            Cell::new(format!("{:?}", tool.definition.category).to_lowercase()),
            Cell::new(mode),
            Cell::new(tool.total_uses),
            Cell::new(state.map_or(0, |s| s.turns_since_use)),
            Cell::new(format_timestamp(state.and_then(|s| s.last_used_at))),
        ]);
    }
    print_table(table)?;

    if let Some(tool) = suggest_for {
        if suggestions.is_empty() {
            println!("No tools are commonly used with {}.", tool);
        } else {
            println!("Often used with {}: {}", tool, suggestions.join(", "));
        }
    }
    Ok(())
}
