//! Cross-cutting error types for hdr.
//!
//! Parser and configuration errors live in their own crates. `CoreError`
//! only covers what this crate does itself: reading and writing the cached
//! module.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Reading or writing a module file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The module file is not valid JSON for the current model.
    #[error("Module serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
