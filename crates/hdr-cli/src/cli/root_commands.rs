use clap::{Args, Subcommand};

use crate::cli::OutputFormat;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run castxml over the configured headers and build the declaration model.
    Parse(ParseArgs),
    /// Print one declaration from the cached model.
    Show(ShowArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ParseArgs {
    /// Reparse even when the synthesized headers are unchanged.
    #[arg(long)]
    pub force: bool,

    /// Output format.
    #[arg(short, long, default_value = "summary")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, Args)]
pub struct ShowArgs {
    /// Declaration name (enum, struct, interface, function, constant, guid or define).
    pub name: String,
}
