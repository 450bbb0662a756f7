//! # hdr-config
//!
//! Layered configuration loading for hdr using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`HDR_*` prefix, `__` as separator)
//! 2. Project-level `hdr.toml` (or an explicit file)
//! 3. User-level `~/.config/hdr/config.toml`
//! 4. Built-in defaults
//!
//! # Usage
//!
//! ```no_run
//! use hdr_config::HdrConfig;
//!
//! let config = HdrConfig::load().expect("config");
//! for unit in &config.units {
//!     println!("unit {} with {} headers", unit.id, unit.includes.len());
//! }
//! ```

mod castxml;
mod error;
mod include_dir;
mod output;
mod unit;
mod variables;

pub use castxml::CastXmlConfig;
pub use error::ConfigError;
pub use include_dir::{IncludeDir, NoRegistry, RegistryLookup};
pub use output::OutputConfig;
pub use unit::{
    ConstFromMacroRule, EnumFromMacroRule, IncludeRule, UnitConfig, include_id_of,
};
pub use variables::Variables;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HdrConfig {
    /// Include search directories, plain or registry-indirected.
    #[serde(default)]
    pub include_dirs: Vec<IncludeDir>,

    /// C++ type name -> target type name. Bound typedefs stop type resolution.
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,

    /// Static `$(NAME)` variables.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    #[serde(default)]
    pub castxml: CastXmlConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub units: Vec<UnitConfig>,
}

impl HdrConfig {
    /// Load configuration from all sources, using `hdr.toml` in the current directory.
    ///
    /// # Errors
    /// Returns `ConfigError` if a source cannot be parsed or the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("hdr.toml"))
    }

    /// Load configuration with `project_file` as the project-level layer.
    ///
    /// # Errors
    /// Returns `ConfigError` if a source cannot be parsed or the result fails validation.
    pub fn load_from(project_file: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = Self::figment(project_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can add providers on top.
    #[must_use]
    pub fn figment(project_file: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        if project_file.exists() {
            figment = figment.merge(Toml::file(project_file));
        }

        figment.merge(Env::prefixed("HDR_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hdr").join("config.toml"))
    }

    /// Check unit ids and compile every macro rule regex and diagnostic filter.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for unit in &self.units {
            if unit.id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "units.id".into(),
                    reason: "unit id must not be empty".into(),
                });
            }
            if !seen.insert(unit.id.to_ascii_lowercase()) {
                return Err(ConfigError::InvalidValue {
                    field: "units.id".into(),
                    reason: format!("duplicate unit id '{}'", unit.id),
                });
            }
            if let Some(include) = unit
                .includes
                .iter()
                .find(|i| i.include_id() == unit.id.to_ascii_lowercase())
            {
                return Err(ConfigError::InvalidValue {
                    field: "units.id".into(),
                    reason: format!(
                        "unit id '{}' would shadow included header '{}'",
                        unit.id, include.file
                    ),
                });
            }
            for rule in &unit.enum_from_macros {
                check_regex(&format!("units[{}].enum_from_macros", unit.id), &rule.macro_pattern)?;
            }
            for rule in &unit.const_from_macros {
                check_regex(&format!("units[{}].const_from_macros", unit.id), &rule.macro_pattern)?;
            }
        }
        for filter in &self.castxml.diagnostic_filters {
            check_regex("castxml.diagnostic_filters", filter)?;
        }
        Ok(())
    }

    /// All include rules across units, in configuration order.
    pub fn include_rules(&self) -> impl Iterator<Item = &IncludeRule> {
        self.units.iter().flat_map(|u| u.includes.iter())
    }

    /// Expand `$(..)` and `#(..)` references in bindings, injected text and rule types.
    pub fn expand_variables(&mut self, variables: &Variables) {
        for target in self.bindings.values_mut() {
            *target = variables.expand(target);
        }
        for unit in &mut self.units {
            for line in &mut unit.prologue {
                *line = variables.expand(line);
            }
            for include in &mut unit.includes {
                for text in [&mut include.pre, &mut include.post].into_iter().flatten() {
                    *text = variables.expand(text);
                }
            }
            for rule in &mut unit.const_from_macros {
                rule.cpp_type = variables.expand(&rule.cpp_type);
            }
        }
    }

    /// Static variables as a fresh substitution table.
    #[must_use]
    pub fn variable_table(&self) -> Variables {
        Variables::new(self.variables.clone())
    }
}

fn check_regex(field: &str, pattern: &str) -> Result<(), ConfigError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = HdrConfig::default();
        assert!(config.units.is_empty());
        assert!(config.validate().is_ok());
        assert_eq!(config.output.root_name, "hdr");
    }

    #[test]
    fn duplicate_unit_ids_are_rejected() {
        let unit = UnitConfig {
            id: "d3d11".into(),
            ..UnitConfig::default()
        };
        let config = HdrConfig {
            units: vec![unit.clone(), unit],
            ..HdrConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn bad_macro_regex_is_rejected() {
        let config = HdrConfig {
            units: vec![UnitConfig {
                id: "x".into(),
                enum_from_macros: vec![EnumFromMacroRule {
                    enum_name: "E".into(),
                    macro_pattern: "(unclosed".into(),
                }],
                ..UnitConfig::default()
            }],
            ..HdrConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn expand_variables_touches_bindings_and_injected_text() {
        let mut config = HdrConfig {
            bindings: BTreeMap::from([("HANDLE".to_string(), "$(NS).Handle".to_string())]),
            variables: BTreeMap::from([("NS".to_string(), "Sdk".to_string())]),
            units: vec![UnitConfig {
                id: "x".into(),
                includes: vec![IncludeRule {
                    file: "x.h".into(),
                    pre: Some("#define VER #(X_VERSION)".into()),
                    ..IncludeRule::default()
                }],
                ..UnitConfig::default()
            }],
            ..HdrConfig::default()
        };
        let mut vars = config.variable_table();
        vars.set_dynamic("X_VERSION", "3");
        config.expand_variables(&vars);

        assert_eq!(config.bindings["HANDLE"], "Sdk.Handle");
        assert_eq!(
            config.units[0].includes[0].pre.as_deref(),
            Some("#define VER 3")
        );
    }
}
