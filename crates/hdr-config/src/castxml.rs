//! Settings for the external castxml executable.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default arguments put castxml into gccxml-compatible C++11 mode.
fn default_base_args() -> Vec<String> {
    ["--castxml-gccxml", "-x", "c++", "-std=c++11"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CastXmlConfig {
    /// Path to the castxml binary. When unset, `CASTXML` and then `PATH` are searched.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Fixed arguments passed on every invocation.
    #[serde(default = "default_base_args")]
    pub base_args: Vec<String>,

    /// Extra arguments appended after the base arguments (defines, target flags).
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Regexes matched against castxml diagnostic lines; a match downgrades the line to a warning.
    #[serde(default)]
    pub diagnostic_filters: Vec<String>,
}

impl Default for CastXmlConfig {
    fn default() -> Self {
        Self {
            executable: None,
            base_args: default_base_args(),
            extra_args: Vec::new(),
            diagnostic_filters: Vec::new(),
        }
    }
}
