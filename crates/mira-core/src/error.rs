//! Error types for the MIRA engine

use std::path::PathBuf;
use thiserror::Error;

/// Failures that callers must be able to tell apart.
///
/// Everything else the engine does degrades to empty results and is
/// returned as `anyhow::Result`.
#[derive(Error, Debug)]
pub enum MiraError {
    #[error("Failed to open memory store at {path}: {source}")]
    StoreInit {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine initialization
pub type Result<T> = std::result::Result<T, MiraError>;
