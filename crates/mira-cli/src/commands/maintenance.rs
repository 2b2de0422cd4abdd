use anyhow::Result;
use mira_core::Mira;

use crate::output::{OutputFormat, json::print_json};

/// Run every maintenance step once, in the foreground.
pub fn run_sleep(mira: &Mira, format: OutputFormat) -> Result<()> {
    let report = mira.events().force_sleep_cycle()?;

    if format.is_json() {
        return print_json(&report);
    }

    println!("Sleep cycle finished:");
    println!("  collapsed segments: {}", report.collapsed.len());
    println!(
        "  decay: scanned {}, pruned {}, checkpointed {}",
        report.decay.scanned, report.decay.pruned, report.decay.checkpointed
    );
    println!(
        "  dream: {} owner(s), {} link(s), {} pattern(s)",
        report.dream.owners_scanned, report.dream.links_created, report.dream.patterns_created
    );
    println!("  expired tools: {}", report.expired_tools.len());
    for (owner, tool) in &report.expired_tools {
        println!("    {} / {}", owner, tool);
    }
    Ok(())
}
