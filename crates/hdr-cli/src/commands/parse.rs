use anyhow::Context;
use hdr_parser::{CastXml, CppParser};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ParseArgs;
use crate::commands::load_config;
use crate::output;

/// Handle `hdr parse`. Returns whether the run logged errors.
pub fn handle(args: &ParseArgs, flags: &GlobalFlags) -> anyhow::Result<bool> {
    let mut config = load_config(flags)?;
    config.output.force |= args.force;

    let castxml = CastXml::locate(&config.castxml).context("castxml is required to parse headers")?;
    tracing::debug!(executable = %castxml.executable().display(), "using castxml");

    let mut parser = CppParser::new(config, Box::new(castxml));
    let module = parser.run().context("header parse failed")?;
    output::print_module(module, args.format)?;

    let log = parser.logger();
    if !flags.quiet {
        eprintln!("{}", output::diagnostic_totals(log.error_count(), log.warning_count()));
    }
    Ok(log.has_errors())
}
