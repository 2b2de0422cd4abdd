mod cli;
mod commands;
mod completions;
mod error;
mod output;
mod setup;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use mira_storage::paths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configure logging: always write to file, mirror to stderr with --verbose
    let _guard = match init_logging(cli.verbose) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Failed to initialize logging: {err:#}");
            None
        }
    };

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

fn init_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = paths::ensure_mira_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "mira.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true);
    let stderr_layer = verbose.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;
    Ok(guard)
}

async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Completions { shell } = &command {
        completions::generate_completions(*shell);
        return Ok(());
    }

    let config = setup::load_config(cli.config.as_deref())?;
    let mira = setup::prepare_engine(cli.db_path, config)?;
    let format = cli.format;

    match command {
        Commands::Completions { .. } => Ok(()),
        Commands::Remember(args) => commands::memory::remember(&mira, args, format),
        Commands::Recall {
            owner,
            query,
            limit,
        } => commands::memory::recall(&mira, &owner, &query, limit, format),
        Commands::Forget { id } => commands::memory::forget(&mira, &id, format),
        Commands::Show { id, no_boost } => commands::memory::show(&mira, &id, !no_boost, format),
        Commands::Strongest { owner, limit } => {
            commands::memory::strongest(&mira, &owner, limit, format)
        }
        Commands::Recent {
            owner,
            limit,
            min_strength,
        } => commands::memory::recent(&mira, &owner, limit, min_strength, format),
        Commands::Stats { owner } => commands::memory::stats(&mira, &owner, format),
        Commands::Link(args) => commands::link::link(&mira, args, format),
        Commands::Links { id, link_type } => commands::link::links(&mira, &id, link_type, format),
        Commands::Doc { command } => commands::doc::run(&mira, command, format),
        Commands::Tools { owner, suggest_for } => {
            commands::tools::run(&mira, &owner, suggest_for, format)
        }
        Commands::Chat { owner, importance } => {
            commands::chat::run(&mira, &owner, importance, format)
        }
        Commands::Sleep => commands::maintenance::run_sleep(&mira, format),
        Commands::Daemon => commands::daemon::run(mira).await,
    }
}
