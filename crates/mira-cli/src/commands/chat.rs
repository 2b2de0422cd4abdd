//! Line-oriented conversation driver.
//!
//! Each stdin line is a user turn, except lines of the form
//! `assistant: text` or `assistant(tool_a,tool_b): text`, which record an
//! assistant reply and the tools it used. The open segment is consolidated
//! when input ends.

use anyhow::Result;
use colored::Colorize;
use mira_core::Mira;
use std::io::BufRead;

use crate::output::{OutputFormat, json::print_json};

#[derive(Debug, PartialEq)]
enum Turn {
    User(String),
    Assistant { text: String, tools: Vec<String> },
}

fn parse_turn(line: &str) -> Option<Turn> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix("assistant") {
        if let Some(text) = rest.strip_prefix(':') {
            return Some(Turn::Assistant {
                text: text.trim().to_string(),
                tools: Vec::new(),
            });
        }
        if let Some((tools, text)) = rest.strip_prefix('(').and_then(|r| r.split_once("):")) {
            let tools = tools
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            return Some(Turn::Assistant {
                text: text.trim().to_string(),
                tools,
            });
        }
    }

    let text = line.strip_prefix("user:").unwrap_or(line).trim();
    Some(Turn::User(text.to_string()))
}

pub fn run(mira: &Mira, owner: &str, importance: f64, format: OutputFormat) -> Result<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Some(turn) = parse_turn(&line?) else {
            continue;
        };

        match turn {
            Turn::User(text) => {
                let turn = mira.process_user_message(owner, &text, importance)?;
                if format.is_json() {
                    print_json(&turn)?;
                    continue;
                }

                if !turn.activated_tools.is_empty() {
                    println!("{} {}", "+ tools:".green(), turn.activated_tools.join(", "));
                }
                if !turn.expired_tools.is_empty() {
                    println!("{} {}", "- tools:".yellow(), turn.expired_tools.join(", "));
                }
                println!("{}", turn.context);
                println!("{}", "---".dimmed());
            }
            Turn::Assistant { text, tools } => {
                mira.process_assistant_response(owner, &text, &tools)?;
            }
        }
    }

    if let Some(summary) = mira.working().clear_working_memory(owner)? {
        if !format.is_json() {
            println!("{} {}", "Consolidated conversation into".dimmed(), summary.id);
        }
    }
    Ok(())
}
