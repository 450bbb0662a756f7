//! # hdr-cli
//!
//! `hdr` binary: drives castxml over the configured SDK headers and prints
//! or inspects the resulting declaration model.

use clap::Parser;

mod cli;
mod commands;
mod output;

/// Exit code for a run that finished but logged errors.
const EXIT_LOGGED_ERRORS: i32 = 2;

fn main() {
    match run() {
        Ok(false) => {}
        Ok(true) => std::process::exit(EXIT_LOGGED_ERRORS),
        Err(error) => {
            eprintln!("hdr error: {error:#}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the command completed with logged errors.
fn run() -> anyhow::Result<bool> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    match &cli.command {
        cli::Commands::Parse(args) => commands::parse::handle(args, &flags),
        cli::Commands::Show(args) => commands::show::handle(args, &flags).map(|()| false),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("HDR_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
