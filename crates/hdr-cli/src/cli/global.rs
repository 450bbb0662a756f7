use std::path::PathBuf;

use clap::ValueEnum;

/// How `hdr parse` prints the resolved module.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// One line per include with declaration counts.
    Summary,
    /// The whole module as pretty JSON.
    Json,
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub config: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}
