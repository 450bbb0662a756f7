//! Documentation lookup for declarations.
//!
//! A provider answers by qualified name (`IWidget`, `IWidget::Draw`). Member
//! texts are matched by name and fall back to position when the counts agree;
//! anything else is left undocumented without a diagnostic.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use hdr_core::{CppDecl, CppInterface, CppModule, CppSignature, DocInfo};
use serde::Deserialize;

use crate::error::ParserError;
use crate::logger::Logger;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocSubItem {
    pub term: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    /// Texts for members: enum items, fields, parameters.
    #[serde(default)]
    pub items: Vec<DocSubItem>,
}

impl DocItem {
    fn doc_info(&self) -> DocInfo {
        DocInfo {
            id: self.id.clone(),
            description: self.description.clone(),
            remarks: self.remarks.clone(),
        }
    }

    /// Text for member `index` named `name` out of `count` members.
    fn member(&self, name: &str, index: usize, count: usize) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.term == name)
            .or_else(|| (self.items.len() == count).then(|| &self.items[index]))
            .map(|item| item.description.as_str())
    }
}

pub trait DocumentationProvider {
    fn find_documentation(&self, qualified_name: &str) -> Option<DocItem>;
}

/// Provider that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDocumentation;

impl DocumentationProvider for NoDocumentation {
    fn find_documentation(&self, _qualified_name: &str) -> Option<DocItem> {
        None
    }
}

/// Provider backed by a JSON object keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct JsonDocumentation {
    entries: HashMap<String, DocItem>,
}

impl JsonDocumentation {
    #[must_use]
    pub const fn from_entries(entries: HashMap<String, DocItem>) -> Self {
        Self { entries }
    }

    /// # Errors
    /// Returns `ParserError::Io` for an unreadable file and `ParserError::Core`
    /// when the JSON does not match the expected shape.
    pub fn load(path: &Path) -> Result<Self, ParserError> {
        let text = fs::read_to_string(path).map_err(|e| ParserError::io(path, e))?;
        let entries = serde_json::from_str(&text).map_err(hdr_core::CoreError::from)?;
        Ok(Self { entries })
    }
}

impl DocumentationProvider for JsonDocumentation {
    fn find_documentation(&self, qualified_name: &str) -> Option<DocItem> {
        self.entries.get(qualified_name).cloned()
    }
}

/// Provider for an optional doc file; a file that fails to load is reported and ignored.
pub fn load_provider(path: Option<&Path>, log: &mut Logger) -> Box<dyn DocumentationProvider> {
    let Some(path) = path else {
        return Box::new(NoDocumentation);
    };
    match JsonDocumentation::load(path) {
        Ok(provider) => Box::new(provider),
        Err(error) => {
            log.warning(format!("Documentation disabled: {error}"));
            Box::new(NoDocumentation)
        }
    }
}

fn merge(target: &mut DocInfo, source: DocInfo) {
    if source.id.is_some() {
        target.id = source.id;
    }
    if source.description.is_some() {
        target.description = source.description;
    }
    if source.remarks.is_some() {
        target.remarks = source.remarks;
    }
}

fn describe(target: &mut DocInfo, text: Option<&str>) {
    if let Some(text) = text {
        target.description = Some(text.to_string());
    }
}

fn document_parameters(signature: &mut CppSignature, item: &DocItem) {
    let count = signature.parameters.len();
    for (index, parameter) in signature.parameters.iter_mut().enumerate() {
        describe(&mut parameter.doc, item.member(&parameter.name, index, count));
    }
}

/// Attach documentation to every declaration of the module.
pub fn apply_documentation(module: &mut CppModule, provider: &dyn DocumentationProvider) {
    for decl in module.includes.iter_mut().flat_map(|i| i.decls.iter_mut()) {
        let Some(item) = provider.find_documentation(decl.name()) else {
            if let CppDecl::Interface(interface) = decl {
                document_methods(interface, provider);
            }
            continue;
        };

        match &mut *decl {
            CppDecl::Enum(e) => {
                let count = e.items.len();
                for (index, enum_item) in e.items.iter_mut().enumerate() {
                    describe(&mut enum_item.doc, item.member(&enum_item.name, index, count));
                }
            }
            CppDecl::Struct(s) => {
                let count = s.fields.len();
                for (index, field) in s.fields.iter_mut().enumerate() {
                    describe(&mut field.doc, item.member(&field.name, index, count));
                }
            }
            CppDecl::Function(f) => document_parameters(&mut f.signature, &item),
            CppDecl::Interface(interface) => document_methods(interface, provider),
            CppDecl::Constant(_) | CppDecl::Guid(_) | CppDecl::Define(_) => {}
        }

        if let Some(doc) = decl.doc_mut() {
            merge(doc, item.doc_info());
        }
    }
}

fn document_methods(interface: &mut CppInterface, provider: &dyn DocumentationProvider) {
    for method in &mut interface.methods {
        let qualified = format!("{}::{}", interface.name, method.name);
        if let Some(item) = provider.find_documentation(&qualified) {
            document_parameters(&mut method.signature, &item);
            merge(&mut method.doc, item.doc_info());
        }
    }
}
