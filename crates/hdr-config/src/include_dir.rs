//! Include search directories: plain paths or registry-indirected roots.
//!
//! A registry entry has the form `=HIVE\Key\Path\ValueName;sub\path`. The
//! value named by the last key segment holds a root directory and `sub\path`
//! is appended to it.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum IncludeDir {
    Plain(PathBuf),
    Registry {
        hive: String,
        key: String,
        value: String,
        subpath: String,
    },
}

impl IncludeDir {
    /// Parse one configured entry.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for an empty entry or a registry
    /// entry without hive, key and value name.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(invalid(entry, "empty include directory"));
        }

        let Some(registry) = entry.strip_prefix('=') else {
            return Ok(Self::Plain(PathBuf::from(entry)));
        };

        let (registry_path, subpath) = registry.split_once(';').unwrap_or((registry, ""));
        let (hive, rest) = registry_path
            .split_once('\\')
            .ok_or_else(|| invalid(entry, "registry entry needs a hive and a key"))?;
        let (key, value) = rest
            .rsplit_once('\\')
            .ok_or_else(|| invalid(entry, "registry entry needs a value name"))?;
        if hive.is_empty() || key.is_empty() || value.is_empty() {
            return Err(invalid(entry, "registry entry has an empty segment"));
        }

        Ok(Self::Registry {
            hive: hive.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            subpath: subpath.to_string(),
        })
    }

    /// Resolve to a concrete directory.
    ///
    /// # Errors
    /// Returns `ConfigError::UnresolvedIncludeDir` when the registry value is absent.
    pub fn resolve(&self, registry: &dyn RegistryLookup) -> Result<PathBuf, ConfigError> {
        match self {
            Self::Plain(path) => Ok(path.clone()),
            Self::Registry {
                hive,
                key,
                value,
                subpath,
            } => {
                let root = registry.query(hive, key, value).ok_or_else(|| {
                    ConfigError::UnresolvedIncludeDir {
                        entry: self.to_string(),
                        reason: format!("registry value {hive}\\{key}\\{value} not found"),
                    }
                })?;
                let mut path = PathBuf::from(root);
                for segment in subpath.split(['\\', '/']).filter(|s| !s.is_empty()) {
                    path.push(segment);
                }
                Ok(path)
            }
        }
    }
}

fn invalid(entry: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: format!("include_dirs[{entry}]"),
        reason: reason.to_string(),
    }
}

impl fmt::Display for IncludeDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(path) => write!(f, "{}", path.display()),
            Self::Registry {
                hive,
                key,
                value,
                subpath,
            } => {
                write!(f, "={hive}\\{key}\\{value}")?;
                if !subpath.is_empty() {
                    write!(f, ";{subpath}")?;
                }
                Ok(())
            }
        }
    }
}

impl TryFrom<String> for IncludeDir {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IncludeDir> for String {
    fn from(value: IncludeDir) -> Self {
        value.to_string()
    }
}

/// Source of registry-indirected directory roots.
pub trait RegistryLookup {
    fn query(&self, hive: &str, key: &str, value: &str) -> Option<String>;
}

/// Lookup for hosts without a registry: every query misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegistry;

impl RegistryLookup for NoRegistry {
    fn query(&self, _hive: &str, _key: &str, _value: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    struct FakeRegistry(HashMap<String, String>);

    impl RegistryLookup for FakeRegistry {
        fn query(&self, hive: &str, key: &str, value: &str) -> Option<String> {
            self.0.get(&format!("{hive}\\{key}\\{value}")).cloned()
        }
    }

    #[test]
    fn plain_path_parses_verbatim() {
        let dir = IncludeDir::parse("/usr/include/wine").expect("plain");
        assert_eq!(dir, IncludeDir::Plain(PathBuf::from("/usr/include/wine")));
    }

    #[test]
    fn registry_entry_splits_hive_key_value_and_subpath() {
        let dir = IncludeDir::parse(
            r"=HKLM\SOFTWARE\Microsoft\Windows Kits\Installed Roots\KitsRoot10;Include\um",
        )
        .expect("registry");
        assert_eq!(
            dir,
            IncludeDir::Registry {
                hive: "HKLM".into(),
                key: r"SOFTWARE\Microsoft\Windows Kits\Installed Roots".into(),
                value: "KitsRoot10".into(),
                subpath: r"Include\um".into(),
            }
        );
    }

    #[test]
    fn registry_entry_resolves_through_lookup() {
        let registry = FakeRegistry(HashMap::from([(
            r"HKLM\SOFTWARE\Kits\Root".to_string(),
            "/kits".to_string(),
        )]));
        let dir = IncludeDir::parse(r"=HKLM\SOFTWARE\Kits\Root;Include\um").expect("registry");
        assert_eq!(
            dir.resolve(&registry).expect("resolves"),
            PathBuf::from("/kits/Include/um")
        );
    }

    #[test]
    fn registry_miss_is_unresolved() {
        let dir = IncludeDir::parse(r"=HKLM\SOFTWARE\Kits\Root").expect("registry");
        assert!(matches!(
            dir.resolve(&NoRegistry),
            Err(ConfigError::UnresolvedIncludeDir { .. })
        ));
    }

    #[test]
    fn malformed_registry_entry_is_rejected() {
        assert!(IncludeDir::parse("=HKLM").is_err());
        assert!(IncludeDir::parse("   ").is_err());
    }

    #[test]
    fn display_round_trips_registry_form() {
        let text = r"=HKCU\Software\Tool\Dir;include";
        let dir = IncludeDir::parse(text).expect("registry");
        assert_eq!(dir.to_string(), text);
    }
}
