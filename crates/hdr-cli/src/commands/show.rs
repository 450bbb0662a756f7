use anyhow::{Context, bail};
use hdr_core::CppModule;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ShowArgs;
use crate::commands::load_config;

/// Handle `hdr show`.
pub fn handle(args: &ShowArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = load_config(flags)?;
    let cache = config.output.module_cache();
    if !cache.is_file() {
        bail!("no cached model at {}; run 'hdr parse' first", cache.display());
    }

    let module = CppModule::read_from(&cache)?;
    let Some(decl) = module.find(&args.name) else {
        bail!("no declaration named '{}' in {}", args.name, cache.display());
    };
    let rendered = serde_json::to_string_pretty(decl).context("failed to render declaration")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use hdr_core::{CppDecl, CppEnum};
    use tempfile::TempDir;

    use super::*;
    use crate::cli::GlobalFlags;

    fn project(with_cache: bool) -> (TempDir, GlobalFlags) {
        let dir = TempDir::new().expect("tempdir");
        let config = dir.path().join("hdr.toml");
        fs::write(
            &config,
            format!("[output]\ndirectory = {:?}\nroot_name = \"sdk\"\n", dir.path().display().to_string()),
        )
        .expect("write config");

        if with_cache {
            let mut module = CppModule::default();
            module.include_mut("widget").push(CppDecl::Enum(CppEnum {
                name: "COLOR".into(),
                ..CppEnum::default()
            }));
            module.write_to(&dir.path().join("sdk-out.json")).expect("write cache");
        }

        let flags = GlobalFlags {
            config: Some(config),
            quiet: true,
            verbose: false,
        };
        (dir, flags)
    }

    fn show(name: &str) -> ShowArgs {
        ShowArgs { name: name.into() }
    }

    #[test]
    fn cached_declaration_is_found() {
        let (_dir, flags) = project(true);
        handle(&show("COLOR"), &flags).expect("declaration printed");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let (_dir, flags) = project(true);
        let error = handle(&show("SHAPE"), &flags).expect_err("unknown name");
        assert!(error.to_string().contains("no declaration named 'SHAPE'"));
    }

    #[test]
    fn missing_cache_asks_for_a_parse() {
        let (_dir, flags) = project(false);
        let error = handle(&show("COLOR"), &flags).expect_err("no cache");
        assert!(error.to_string().contains("run 'hdr parse' first"));
    }
}
