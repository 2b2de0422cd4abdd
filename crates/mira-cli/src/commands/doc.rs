use anyhow::{Result, bail};
use colored::Colorize;
use comfy_table::{Cell, Table};
use mira_core::Mira;
use serde_json::json;

use crate::cli::DocCommands;
use crate::commands::utils::{format_timestamp, preview_text};
use crate::output::table::print_table;
use crate::output::{OutputFormat, json::print_json};

pub fn run(mira: &Mira, command: DocCommands, format: OutputFormat) -> Result<()> {
    match command {
        DocCommands::Set {
            owner,
            title,
            content,
        } => set_doc(mira, &owner, &title, &content, format),
        DocCommands::List { owner } => list_docs(mira, &owner, format),
        DocCommands::Delete { id } => delete_doc(mira, &id, format),
    }
}

fn set_doc(mira: &Mira, owner: &str, title: &str, content: &str, format: OutputFormat) -> Result<()> {
    let doc = mira.store().set_domain_doc(owner, title, content)?;

    if format.is_json() {
        return print_json(&doc);
    }

    println!("{} {} ({})", "Saved".green().bold(), doc.title, doc.id);
    Ok(())
}

fn list_docs(mira: &Mira, owner: &str, format: OutputFormat) -> Result<()> {
    let docs = mira.store().get_domain_docs(owner)?;

    if format.is_json() {
        return print_json(&docs);
    }

    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Updated", "Preview"]);
    for doc in &docs {
        table.add_row(vec![
            Cell::new(doc.id.clone()),
            Cell::new(doc.title.clone()),
            Cell::new(format_timestamp(Some(doc.updated_at))),
            Cell::new(preview_text(&doc.content, 60)),
        ]);
    }
    print_table(table)
}

fn delete_doc(mira: &Mira, id: &str, format: OutputFormat) -> Result<()> {
    let deleted = mira.store().delete_domain_doc(id)?;

    if format.is_json() {
        return print_json(&json!({ "id": id, "deleted": deleted }));
    }

    if !deleted {
        bail!("Document not found: {}", id);
    }
    println!("{} {}", "Deleted".green().bold(), id);
    Ok(())
}
