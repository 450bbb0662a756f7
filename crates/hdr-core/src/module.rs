//! The module tree and its on-disk cache.

use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::model::{
    CppConstant, CppDecl, CppDefine, CppEnum, CppFunction, CppGuid, CppInterface, CppStruct,
};

/// Declarations that originate from one configured header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppInclude {
    /// Include id: the header file stem, lower-cased.
    pub name: String,
    pub decls: Vec<CppDecl>,
}

macro_rules! decl_filter {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&self) -> impl Iterator<Item = &$ty> {
            self.decls.iter().filter_map(|decl| match decl {
                CppDecl::$variant(inner) => Some(inner),
                _ => None,
            })
        }
    };
}

impl CppInclude {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decls: Vec::new(),
        }
    }

    pub fn push(&mut self, decl: CppDecl) {
        self.decls.push(decl);
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CppDecl> {
        self.decls.iter().find(|d| d.name() == name)
    }

    decl_filter!(enums, Enum, CppEnum);
    decl_filter!(structs, Struct, CppStruct);
    decl_filter!(interfaces, Interface, CppInterface);
    decl_filter!(functions, Function, CppFunction);
    decl_filter!(constants, Constant, CppConstant);
    decl_filter!(guids, Guid, CppGuid);
    decl_filter!(defines, Define, CppDefine);
}

/// The full declaration tree of one parser run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppModule {
    pub includes: Vec<CppInclude>,
}

impl CppModule {
    #[must_use]
    pub fn include(&self, name: &str) -> Option<&CppInclude> {
        self.includes.iter().find(|i| i.name == name)
    }

    /// Existing include with that name, or a new empty one appended at the end.
    pub fn include_mut(&mut self, name: &str) -> &mut CppInclude {
        let index = match self.includes.iter().position(|i| i.name == name) {
            Some(index) => index,
            None => {
                self.includes.push(CppInclude::new(name));
                self.includes.len() - 1
            }
        };
        &mut self.includes[index]
    }

    /// First declaration with this name in any include.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CppDecl> {
        self.includes.iter().find_map(|i| i.find(name))
    }

    pub fn decls(&self) -> impl Iterator<Item = &CppDecl> {
        self.includes.iter().flat_map(|i| i.decls.iter())
    }

    /// Write the module as pretty JSON, creating parent directories.
    ///
    /// # Errors
    /// Returns `CoreError::Io` if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a module previously written by [`CppModule::write_to`].
    ///
    /// # Errors
    /// Returns `CoreError::Io` if the file is unreadable and `CoreError::Json`
    /// if its content does not match the model.
    pub fn read_from(path: &Path) -> Result<Self, CoreError> {
        let json = fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
