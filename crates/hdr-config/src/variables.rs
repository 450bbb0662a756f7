//! `$(NAME)` / `#(NAME)` substitution over configuration strings.
//!
//! `$(NAME)` reads the static `[variables]` table, `#(NAME)` reads the
//! dynamic table that a parse run fills with captured macro values.
//! Unknown names are left in place.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([$#])\(([A-Za-z_][A-Za-z0-9_]*)\)").expect("valid regex"));

#[derive(Debug, Clone, Default)]
pub struct Variables {
    statics: BTreeMap<String, String>,
    dynamics: BTreeMap<String, String>,
}

impl Variables {
    #[must_use]
    pub const fn new(statics: BTreeMap<String, String>) -> Self {
        Self {
            statics,
            dynamics: BTreeMap::new(),
        }
    }

    pub fn set_dynamic(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.dynamics.insert(name.into(), value.into());
    }

    pub fn extend_dynamic<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.dynamics.extend(values);
    }

    #[must_use]
    pub fn dynamic(&self, name: &str) -> Option<&str> {
        self.dynamics.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }

    /// Substitute every known variable reference in `text`, one pass.
    #[must_use]
    pub fn expand(&self, text: &str) -> String {
        VARIABLE_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let table = if &caps[1] == "$" {
                    &self.statics
                } else {
                    &self.dynamics
                };
                table
                    .get(&caps[2])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Variables {
        let mut vars = Variables::new(BTreeMap::from([(
            "SDK".to_string(),
            "10.0".to_string(),
        )]));
        vars.set_dynamic("D3D11_SDK_VERSION", "7");
        vars
    }

    #[test]
    fn expands_static_and_dynamic_references() {
        assert_eq!(
            vars().expand("kits/$(SDK)/um v#(D3D11_SDK_VERSION)"),
            "kits/10.0/um v7"
        );
    }

    #[test]
    fn unknown_references_stay_verbatim() {
        assert_eq!(vars().expand("$(NOPE) #(SDK)"), "$(NOPE) #(SDK)");
    }

    #[test]
    fn text_without_references_is_unchanged() {
        assert_eq!(vars().expand("plain (text)"), "plain (text)");
    }
}
