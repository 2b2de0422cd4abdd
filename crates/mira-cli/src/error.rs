use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = format!("{:#}", err).to_lowercase();

    if msg.contains("memory not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Find memory ids with:");
        eprintln!("  {} mira recall <owner> <query>", "$".dimmed());
    }

    if msg.contains("failed to open memory store") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check --db-path, or stop the daemon holding the database:");
        eprintln!("  {} mira --db-path /path/to/mira.db stats <owner>", "$".dimmed());
    }

    if msg.contains("invalid configuration") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Fix the TOML file or point --config at another one.");
    }

    std::process::exit(1);
}
