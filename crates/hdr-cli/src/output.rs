use std::collections::BTreeMap;

use hdr_core::CppModule;

use crate::cli::OutputFormat;

/// Print the module in the requested format.
pub fn print_module(module: &CppModule, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Summary => summary(module),
        OutputFormat::Json => serde_json::to_string_pretty(module)?,
    };
    println!("{rendered}");
    Ok(())
}

/// One line per include: `name: N declarations (k kind, ...)`.
#[must_use]
pub fn summary(module: &CppModule) -> String {
    let mut out = String::new();
    for include in &module.includes {
        let mut kinds = BTreeMap::<&str, usize>::new();
        for decl in &include.decls {
            *kinds.entry(decl.kind()).or_default() += 1;
        }
        let breakdown = kinds
            .iter()
            .map(|(kind, count)| format!("{count} {kind}"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{}: {} declarations ({breakdown})\n",
            include.name,
            include.decls.len()
        ));
    }
    if out.is_empty() {
        out.push_str("(no declarations)");
    }
    out.trim_end().to_string()
}

#[must_use]
pub fn diagnostic_totals(errors: usize, warnings: usize) -> String {
    format!("hdr: {errors} error(s), {warnings} warning(s)")
}
