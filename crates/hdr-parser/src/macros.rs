//! `#define` capture from castxml's preprocessor output.
//!
//! castxml run with `-E -dD` prints the preprocessed text with line markers
//! and keeps every `#define`. The marker lines tell which header the
//! following defines come from; system headers (`<built-in>`, `<command line>`)
//! are not tracked.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use hdr_config::include_id_of;
use hdr_core::{CppDecl, CppModule};
use regex::Regex;

use crate::castxml::{DiagnosticRouter, ExternalParser};
use crate::error::ParserError;
use crate::logger::Logger;

static LINE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^#\s*(?:line\s+)?\d+\s+"([^"]*)""#).expect("valid regex"));

static DEFINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*define\s+([A-Za-z_]\w*)(?:\s+(.*))?$").expect("valid regex"));

/// Captured macros, by include id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroSet {
    headers: BTreeMap<String, BTreeMap<String, String>>,
}

impl MacroSet {
    /// Record a define; a later value for the same name in the same header wins.
    pub fn insert(&mut self, header: &str, name: impl Into<String>, value: impl Into<String>) {
        self.headers
            .entry(header.to_string())
            .or_default()
            .insert(name.into(), value.into());
    }

    #[must_use]
    pub fn for_header(&self, include_id: &str) -> Option<&BTreeMap<String, String>> {
        self.headers.get(include_id)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, String>)> {
        self.headers.iter().map(|(id, defines)| (id.as_str(), defines))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild the set from the `Define` declarations of a cached module.
    #[must_use]
    pub fn from_module(module: &CppModule) -> Self {
        let mut set = Self::default();
        for include in &module.includes {
            for decl in &include.decls {
                if let CppDecl::Define(define) = decl {
                    set.insert(&include.name, define.name.clone(), define.value.clone());
                }
            }
        }
        set
    }

    /// Flat name -> value view for variable substitution.
    pub fn dynamic_variables(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.headers
            .values()
            .flatten()
            .map(|(name, value)| (name.clone(), value.clone()))
    }
}

/// Scan preprocessed text for defines, tracking the current header via line markers.
#[must_use]
pub fn parse_preprocessed(text: &str) -> MacroSet {
    let mut set = MacroSet::default();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim_start();
        if !line.starts_with('#') {
            continue;
        }
        if let Some(caps) = LINE_MARKER_RE.captures(line) {
            let path = &caps[1];
            current = if path.starts_with('<') {
                None
            } else {
                Some(include_id_of(path))
            };
            continue;
        }
        let Some(header) = current.as_deref() else {
            continue;
        };
        if let Some(caps) = DEFINE_RE.captures(line) {
            let value = caps.get(2).map_or("", |m| m.as_str().trim());
            if !value.is_empty() {
                set.insert(header, &caps[1], value);
            }
        }
    }

    set
}

/// Runs the preprocess-only pass and collects its defines.
pub struct MacroManager<'p> {
    parser: &'p dyn ExternalParser,
}

impl<'p> MacroManager<'p> {
    #[must_use]
    pub const fn new(parser: &'p dyn ExternalParser) -> Self {
        Self { parser }
    }

    /// # Errors
    /// Returns `ParserError::ProcessFailed` when the preprocessor run fails.
    pub fn capture(
        &self,
        header: &Path,
        include_dirs: &[PathBuf],
        router: &DiagnosticRouter,
        log: &mut Logger,
    ) -> Result<MacroSet, ParserError> {
        log.push_context("Macros");
        let output = self.parser.preprocess(header, include_dirs);
        let result = output.and_then(|output| {
            router.route(&output.stderr, log);
            if output.success {
                Ok(parse_preprocessed(&output.stdout))
            } else {
                Err(ParserError::ProcessFailed {
                    stage: "preprocessing".into(),
                    message: format!("{} reported errors", header.display()),
                })
            }
        });
        log.pop_context();
        result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PREPROCESSED: &str = r#"# 1 "/work/.hdr/sdk.h"
# 1 "<built-in>" 1
#define __STDC__ 1
#define _WIN32 1
# 1 "/work/.hdr/sdk.h" 2
# 1 "/sdk/include/Widget.h" 1
#define WIDGET_SDK_VERSION 7
#define WIDGET_ERROR_BUSY 0x887A0001
#define WIDGET_EMPTY
#define WIDGET_CALL(x) x
#define WIDGET_SDK_VERSION 8
typedef int WIDGET_HANDLE;
#line 1 "/usr/include/stdio.h"
#define EOF (-1)
# 1 "<command line>" 1
#define NDEBUG 1
"#;

    #[test]
    fn last_define_wins_per_header() {
        let set = parse_preprocessed(PREPROCESSED);
        let widget = set.for_header("widget").expect("widget macros");
        assert_eq!(widget["WIDGET_SDK_VERSION"], "8");
        assert_eq!(widget["WIDGET_ERROR_BUSY"], "0x887A0001");
    }

    #[test]
    fn system_markers_clear_the_cursor() {
        let set = parse_preprocessed(PREPROCESSED);
        assert!(set.headers().all(|(_, defines)| !defines.contains_key("_WIN32")));
        assert!(set.headers().all(|(_, defines)| !defines.contains_key("NDEBUG")));
        assert_eq!(set.for_header("stdio").map(|d| d["EOF"].as_str()), Some("(-1)"));
    }

    #[test]
    fn empty_and_function_like_defines_are_ignored() {
        let set = parse_preprocessed(PREPROCESSED);
        let widget = set.for_header("widget").expect("widget macros");
        assert!(!widget.contains_key("WIDGET_EMPTY"));
        assert!(!widget.contains_key("WIDGET_CALL"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn module_defines_rebuild_the_set() {
        let mut module = CppModule::default();
        module.include_mut("widget").push(CppDecl::Define(hdr_core::CppDefine {
            name: "A".into(),
            value: "1".into(),
        }));
        let set = MacroSet::from_module(&module);
        assert_eq!(set.for_header("widget").map(BTreeMap::len), Some(1));
        let vars: Vec<_> = set.dynamic_variables().collect();
        assert_eq!(vars, vec![("A".to_string(), "1".to_string())]);
    }
}
