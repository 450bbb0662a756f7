//! Parser error types for hdr-parser.
//!
//! Every variant is fatal for the run that raised it. Conditions the run
//! survives (filtered diagnostics, malformed GUID literals, unresolvable
//! include directories) go through [`crate::Logger`] instead.

use std::path::PathBuf;

/// Errors that abort a parse run.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("castxml executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("Header to parse not found: {}", .0.display())]
    HeaderNotFound(PathBuf),

    #[error("castxml failed while {stage}: {message}")]
    ProcessFailed { stage: String, message: String },

    #[error("castxml produced no XML at {}", .0.display())]
    NoXmlOutput(PathBuf),

    #[error("Malformed castxml XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Unknown castxml element id '{0}'")]
    UnknownId(String),

    #[error("Unsupported castxml type element <{tag}> (id {id})")]
    UnsupportedTypeTag { tag: String, id: String },

    #[error("castxml element {id} <{tag}> lacks attribute '{attribute}'")]
    MissingAttribute {
        id: String,
        tag: String,
        attribute: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] hdr_config::ConfigError),

    #[error(transparent)]
    Core(#[from] hdr_core::CoreError),
}

impl ParserError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
