//! Configuration units: the headers to parse and the macro synthesis rules that go with them.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Lower-cased file stem, used as the id of an include everywhere in the model.
#[must_use]
pub fn include_id_of(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file)
        .to_ascii_lowercase()
}

/// One group of headers that is written into its own umbrella header.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UnitConfig {
    /// Unit id; names the `<id>.h` umbrella header.
    pub id: String,

    /// Raw lines written at the top of the umbrella header, before any include.
    #[serde(default)]
    pub prologue: Vec<String>,

    #[serde(default)]
    pub includes: Vec<IncludeRule>,

    /// Enums synthesized from groups of `#define`s.
    #[serde(default)]
    pub enum_from_macros: Vec<EnumFromMacroRule>,

    /// Constants synthesized from single `#define`s.
    #[serde(default)]
    pub const_from_macros: Vec<ConstFromMacroRule>,
}

impl UnitConfig {
    /// Include id of the synthesized `<id>-ext.h` header.
    #[must_use]
    pub fn extension_include_id(&self) -> String {
        format!("{}-ext", self.id.to_ascii_lowercase())
    }

    #[must_use]
    pub fn has_macro_rules(&self) -> bool {
        !self.enum_from_macros.is_empty() || !self.const_from_macros.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IncludeRule {
    /// Header as written in `#include "..."`.
    pub file: String,

    /// Keep every declaration of this header in the module.
    #[serde(default)]
    pub attach: bool,

    /// When `attach` is off, the declarations kept by name.
    #[serde(default)]
    pub attach_types: Vec<String>,

    /// Text injected right before the `#include` line.
    #[serde(default)]
    pub pre: Option<String>,

    /// Text injected right after the `#include` line.
    #[serde(default)]
    pub post: Option<String>,
}

impl IncludeRule {
    #[must_use]
    pub fn include_id(&self) -> String {
        include_id_of(&self.file)
    }

    /// Whether a declaration of this header should be kept in the module.
    #[must_use]
    pub fn is_attached(&self, decl_name: &str) -> bool {
        self.attach || self.attach_types.iter().any(|t| t == decl_name)
    }
}

/// Collect every macro whose name matches `macro_pattern` into one enum.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnumFromMacroRule {
    pub enum_name: String,

    /// Regex over macro names, anchored on both ends.
    pub macro_pattern: String,
}

/// Turn every macro whose name matches `macro_pattern` into a typed constant.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConstFromMacroRule {
    /// Regex over macro names, anchored on both ends.
    pub macro_pattern: String,

    /// C++ type of the synthesized constant.
    #[serde(default = "default_const_type")]
    pub cpp_type: String,
}

fn default_const_type() -> String {
    "int".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_id_is_lowercase_stem() {
        assert_eq!(include_id_of("D3D11.h"), "d3d11");
        assert_eq!(include_id_of("shared/dxgi1_2.h"), "dxgi1_2");
        assert_eq!(include_id_of("noext"), "noext");
    }

    #[test]
    fn attach_types_select_by_name() {
        let rule = IncludeRule {
            file: "widget.h".into(),
            attach_types: vec!["IWidget".into()],
            ..IncludeRule::default()
        };
        assert!(rule.is_attached("IWidget"));
        assert!(!rule.is_attached("WIDGET_DESC"));

        let all = IncludeRule {
            attach: true,
            ..rule
        };
        assert!(all.is_attached("WIDGET_DESC"));
    }
}
