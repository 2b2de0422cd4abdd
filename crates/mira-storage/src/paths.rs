//! Path utilities for MIRA directory resolution.

use anyhow::Result;
use std::path::PathBuf;

const MIRA_DIR: &str = ".mira";
const DB_FILE: &str = "mira.db";

/// Environment variable to override the MIRA data directory.
pub const MIRA_DIR_ENV: &str = "MIRA_DIR";

/// Environment variable to override the database file directly.
pub const MIRA_DB_PATH_ENV: &str = "MIRA_DB_PATH";

/// Resolve the MIRA data directory.
/// Priority: MIRA_DIR env var > ~/.mira/
pub fn resolve_mira_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(MIRA_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(MIRA_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the MIRA directory exists and return its path.
pub fn ensure_mira_dir() -> Result<PathBuf> {
    let dir = resolve_mira_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Resolve the database path.
/// Priority: MIRA_DB_PATH env var > <mira dir>/mira.db
pub fn resolve_db_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(MIRA_DB_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    Ok(resolve_mira_dir()?.join(DB_FILE))
}
