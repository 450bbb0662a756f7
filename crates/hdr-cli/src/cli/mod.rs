use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `hdr` binary.
#[derive(Debug, Parser)]
#[command(name = "hdr", version, about = "hdr - C++ SDK header resolver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project configuration file (defaults to ./hdr.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            config: self.config.clone(),
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}
