//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A configuration field has an invalid value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// A registry-indirected include directory could not be resolved.
    #[error("Cannot resolve include directory '{entry}': {reason}")]
    UnresolvedIncludeDir { entry: String, reason: String },
}

