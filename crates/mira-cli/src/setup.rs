//! CLI setup module
//!
//! Resolves paths and configuration and opens the engine.

use anyhow::Result;
use mira_core::{Mira, MiraConfig, SystemClock};
use mira_storage::paths;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Load the engine configuration from `--config` or the default location.
pub fn load_config(config_path: Option<&str>) -> Result<MiraConfig> {
    let config = match config_path {
        Some(path) => MiraConfig::load_from_path(path)?,
        None => MiraConfig::load()?,
    };
    Ok(config)
}

/// Build the embedded engine
pub fn prepare_engine(db_path: Option<String>, config: MiraConfig) -> Result<Mira> {
    let db_path = match db_path {
        Some(path) => PathBuf::from(path),
        None => {
            paths::ensure_mira_dir()?;
            paths::resolve_db_path()?
        }
    };
    debug!(path = %db_path.display(), "Opening engine");
    Ok(Mira::open(db_path, config, Arc::new(SystemClock))?)
}
