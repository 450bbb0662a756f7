//! Where generated headers, castxml output and the module cache go.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_directory() -> PathBuf {
    PathBuf::from(".hdr")
}

fn default_root_name() -> String {
    "hdr".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Working directory for umbrella headers and cache files.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Stem of the root header and the `-gcc.xml` / `-out.json` files.
    #[serde(default = "default_root_name")]
    pub root_name: String,

    /// Reparse even when the umbrella headers are unchanged.
    #[serde(default)]
    pub force: bool,

    /// Optional JSON documentation file keyed by qualified name.
    #[serde(default)]
    pub doc_file: Option<PathBuf>,
}

impl OutputConfig {
    #[must_use]
    pub fn root_header(&self) -> PathBuf {
        self.directory.join(format!("{}.h", self.root_name))
    }

    #[must_use]
    pub fn castxml_output(&self) -> PathBuf {
        self.directory.join(format!("{}-gcc.xml", self.root_name))
    }

    #[must_use]
    pub fn module_cache(&self) -> PathBuf {
        self.directory.join(format!("{}-out.json", self.root_name))
    }

    #[must_use]
    pub fn unit_header(&self, unit_id: &str) -> PathBuf {
        self.directory.join(format!("{unit_id}.h"))
    }

    #[must_use]
    pub fn unit_extension_header(&self, unit_id: &str) -> PathBuf {
        self.directory.join(format!("{unit_id}-ext.h"))
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            root_name: default_root_name(),
            force: false,
            doc_file: None,
        }
    }
}
