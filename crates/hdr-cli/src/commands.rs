pub mod parse;
pub mod show;

use std::path::Path;

use anyhow::Context;
use hdr_config::HdrConfig;

use crate::cli::GlobalFlags;

/// Load `--config` when given, else `hdr.toml` in the current directory.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<HdrConfig> {
    let path = flags.config.as_deref().unwrap_or(Path::new("hdr.toml"));
    HdrConfig::load_from(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}
