//! Synthesized umbrella and extension headers.
//!
//! Each unit gets `<unit>.h` including its configured headers; `<root>.h`
//! includes every unit. Units with macro rules also get `<unit>-ext.h`, where
//! matching `#define`s are re-declared as enum items and typed constants so
//! castxml reports their evaluated values.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use hdr_config::{ConfigError, UnitConfig};
use regex::Regex;

use crate::error::ParserError;
use crate::logger::Logger;
use crate::macros::MacroSet;

/// Marks enum items declared in an extension header.
pub const ENUM_ITEM_SUFFIX: &str = "__hdr_enumitem__";

/// Marks constants declared in an extension header.
pub const VARIABLE_SUFFIX: &str = "__hdr_var__";

const BANNER: &str = "// Generated by hdr. Do not edit.";

/// Comment line for configuration that shapes the model without appearing in
/// the compiled text. Line breaks are flattened and a trailing backslash is
/// dropped so the comment cannot continue onto the next line.
fn setting_comment(text: &mut String, setting: &str) {
    let line = setting.replace(['\r', '\n'], " ");
    text.push_str("// ");
    text.push_str(line.trim_end_matches('\\'));
    text.push('\n');
}

/// `<unit>.h`: the unit's includes, plus its macro rules as comments so that
/// editing a rule changes the header and forces a reparse.
#[must_use]
pub fn unit_header(unit: &UnitConfig) -> String {
    let mut text = format!("{BANNER}\n#pragma once\n");
    for rule in &unit.enum_from_macros {
        setting_comment(&mut text, &format!("enum {} from /{}/", rule.enum_name, rule.macro_pattern));
    }
    for rule in &unit.const_from_macros {
        setting_comment(&mut text, &format!("const {} from /{}/", rule.cpp_type, rule.macro_pattern));
    }
    for line in &unit.prologue {
        text.push_str(line);
        text.push('\n');
    }
    for include in &unit.includes {
        if let Some(pre) = &include.pre {
            text.push_str(pre);
            text.push('\n');
        }
        text.push_str(&format!("#include \"{}\"\n", include.file));
        if let Some(post) = &include.post {
            text.push_str(post);
            text.push('\n');
        }
    }
    if unit.has_macro_rules() {
        text.push_str(&format!("#include \"{}.h\"\n", unit.extension_include_id()));
    }
    text
}

/// `<root>.h`: every unit, preceded by the binding table as comments since
/// bindings decide where type resolution stops.
#[must_use]
pub fn root_header(units: &[UnitConfig], bindings: &BTreeMap<String, String>) -> String {
    let mut text = format!("{BANNER}\n");
    for (name, target) in bindings {
        setting_comment(&mut text, &format!("binding {name} = {target}"));
    }
    for unit in units {
        text.push_str(&format!("#include \"{}.h\"\n", unit.id));
    }
    text
}

/// Content of `<unit>-ext.h` before the macro pass has run.
#[must_use]
pub fn pending_extension_header(unit: &UnitConfig) -> String {
    format!("{BANNER}\n// Macro declarations for unit {} are written after the macro pass.\n", unit.id)
}

fn anchored(pattern: &str, field: &str) -> Result<Regex, ParserError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
        ParserError::Config(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: e.to_string(),
        })
    })
}

/// Macros defined by the unit's own headers; a later header overrides an earlier one.
fn unit_macros<'m>(unit: &UnitConfig, macros: &'m MacroSet) -> BTreeMap<&'m str, &'m str> {
    let mut selected = BTreeMap::new();
    for include in &unit.includes {
        if let Some(defines) = macros.for_header(&include.include_id()) {
            for (name, value) in defines {
                selected.insert(name.as_str(), value.as_str());
            }
        }
    }
    selected
}

/// Declarations for the unit's enum-from-macro and const-from-macro rules.
///
/// An enum rule that matches no macro is skipped with a warning, since an
/// empty enum would not compile.
///
/// # Errors
/// Returns `ParserError::Config` when a rule pattern is not a valid regex.
pub fn extension_header(unit: &UnitConfig, macros: &MacroSet, log: &mut Logger) -> Result<String, ParserError> {
    let defines = unit_macros(unit, macros);
    let mut text = format!("{BANNER}\n");

    for rule in &unit.enum_from_macros {
        let pattern = anchored(&rule.macro_pattern, "enum_from_macros.macro_pattern")?;
        let items: Vec<&str> = defines.keys().copied().filter(|name| pattern.is_match(name)).collect();
        if items.is_empty() {
            log.warning(format!(
                "No macro matches '{}' for enum {}",
                rule.macro_pattern, rule.enum_name
            ));
            continue;
        }
        text.push_str(&format!("enum {} {{\n", rule.enum_name));
        for item in items {
            text.push_str(&format!("    {item}{ENUM_ITEM_SUFFIX} = {item},\n"));
        }
        text.push_str("};\n");
    }

    for rule in &unit.const_from_macros {
        let pattern = anchored(&rule.macro_pattern, "const_from_macros.macro_pattern")?;
        for name in defines.keys().filter(|name| pattern.is_match(name)) {
            text.push_str(&format!(
                "static const {} {name}{VARIABLE_SUFFIX} = {name};\n",
                rule.cpp_type
            ));
        }
    }

    Ok(text)
}

/// Write `content` unless the file already holds exactly these bytes.
///
/// Returns whether the file changed.
///
/// # Errors
/// Returns `ParserError::Io` when the file cannot be written.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool, ParserError> {
    if fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
        return Ok(false);
    }
    fs::write(path, content).map_err(|e| ParserError::io(path, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use hdr_config::{ConstFromMacroRule, EnumFromMacroRule, IncludeRule};
    use pretty_assertions::assert_eq;

    use super::*;

    fn unit() -> UnitConfig {
        UnitConfig {
            id: "sdk-widget".into(),
            prologue: vec!["#define WIN32_LEAN_AND_MEAN".into()],
            includes: vec![IncludeRule {
                file: "widget.h".into(),
                pre: Some("#define WIDGET_NO_INLINE".into()),
                post: Some("#undef WIDGET_NO_INLINE".into()),
                ..IncludeRule::default()
            }],
            enum_from_macros: vec![EnumFromMacroRule {
                enum_name: "WIDGET_ERROR".into(),
                macro_pattern: "WIDGET_ERROR_.*".into(),
            }],
            const_from_macros: vec![ConstFromMacroRule {
                macro_pattern: "WIDGET_SDK_VERSION".into(),
                cpp_type: "unsigned int".into(),
            }],
        }
    }

    fn macros() -> MacroSet {
        let mut set = MacroSet::default();
        set.insert("widget", "WIDGET_ERROR_LOST", "0x887A0002");
        set.insert("widget", "WIDGET_ERROR_BUSY", "0x887A0001");
        set.insert("widget", "WIDGET_SDK_VERSION", "7");
        set.insert("other", "WIDGET_ERROR_ELSEWHERE", "1");
        set
    }

    #[test]
    fn unit_header_wraps_includes_with_injected_text() {
        assert_eq!(
            unit_header(&unit()),
            "// Generated by hdr. Do not edit.\n#pragma once\n\
             // enum WIDGET_ERROR from /WIDGET_ERROR_.*/\n\
             // const unsigned int from /WIDGET_SDK_VERSION/\n\
             #define WIN32_LEAN_AND_MEAN\n\
             #define WIDGET_NO_INLINE\n#include \"widget.h\"\n#undef WIDGET_NO_INLINE\n\
             #include \"sdk-widget-ext.h\"\n"
        );
    }

    #[test]
    fn root_header_includes_each_unit() {
        let text = root_header(&[unit()], &BTreeMap::new());
        assert_eq!(text, "// Generated by hdr. Do not edit.\n#include \"sdk-widget.h\"\n");
    }

    #[test]
    fn macro_rule_edits_change_the_unit_header() {
        let before = unit_header(&unit());
        let mut edited = unit();
        edited.const_from_macros[0].cpp_type = "int".into();
        assert_ne!(unit_header(&edited), before);

        let mut renamed = unit();
        renamed.enum_from_macros[0].enum_name = "WIDGET_STATUS".into();
        assert_ne!(unit_header(&renamed), before);
    }

    #[test]
    fn bindings_are_recorded_in_the_root_header() {
        let bindings = BTreeMap::from([("HANDLE".to_string(), "Sdk.Handle\nV2".to_string())]);
        let text = root_header(&[unit()], &bindings);
        assert!(text.contains("// binding HANDLE = Sdk.Handle V2\n"));
        assert_ne!(text, root_header(&[unit()], &BTreeMap::new()));
    }

    #[test]
    fn extension_header_declares_enum_items_and_constants() {
        let mut log = Logger::new();
        let text = extension_header(&unit(), &macros(), &mut log).expect("header");
        assert_eq!(
            text,
            "// Generated by hdr. Do not edit.\n\
             enum WIDGET_ERROR {\n\
             \x20   WIDGET_ERROR_BUSY__hdr_enumitem__ = WIDGET_ERROR_BUSY,\n\
             \x20   WIDGET_ERROR_LOST__hdr_enumitem__ = WIDGET_ERROR_LOST,\n\
             };\n\
             static const unsigned int WIDGET_SDK_VERSION__hdr_var__ = WIDGET_SDK_VERSION;\n"
        );
        assert_eq!(log.warning_count(), 0);
    }

    #[test]
    fn enum_rule_without_matches_is_skipped() {
        let mut log = Logger::new();
        let text = extension_header(&unit(), &MacroSet::default(), &mut log).expect("header");
        assert!(!text.contains("enum"));
        assert_eq!(log.warning_count(), 1);
    }

    #[test]
    fn write_if_changed_compares_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("unit.h");
        assert!(write_if_changed(&path, "a").expect("write"));
        assert!(!write_if_changed(&path, "a").expect("write"));
        assert!(write_if_changed(&path, "b").expect("write"));
    }
}
