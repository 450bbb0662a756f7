//! Declaration types produced by the resolver.
//!
//! Every declaration carries a name and optional documentation. Containers
//! own their children outright; cross-references (base interface, bound
//! type names) are plain strings so the tree serializes without cycles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::guid::Guid;
use crate::types::{CallingConvention, CppType, ParamFlags};

/// Documentation attached by a documentation provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl DocInfo {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id.is_none() && self.description.is_none() && self.remarks.is_none()
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppEnumItem {
    pub name: String,
    /// Initializer text as reported by castxml.
    pub value: String,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppEnum {
    pub name: String,
    pub items: Vec<CppEnumItem>,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

// ---------------------------------------------------------------------------
// Structs and unions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CppType,
    /// Declaration slot inside the parent, not a byte offset.
    pub offset: u32,
    #[serde(default)]
    pub is_bit_field: bool,
    /// Width in bits when `is_bit_field` is set.
    #[serde(default)]
    pub bit_width: u32,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppStruct {
    pub name: String,
    #[serde(default)]
    pub is_union: bool,
    /// Alignment in bytes; 0 means "platform default".
    pub align: u32,
    pub fields: Vec<CppField>,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

// ---------------------------------------------------------------------------
// Functions, methods, interfaces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CppType,
    pub attributes: ParamFlags,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

/// Return type, calling convention and parameters shared by functions and methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppSignature {
    pub return_type: CppType,
    #[serde(default)]
    pub calling_convention: CallingConvention,
    pub parameters: Vec<CppParameter>,
    #[serde(default)]
    pub is_variadic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppFunction {
    pub name: String,
    pub signature: CppSignature,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppMethod {
    pub name: String,
    pub signature: CppSignature,
    /// Zero-based vtable slot, counting inherited slots.
    pub offset: u32,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppInterface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub methods: Vec<CppMethod>,
    /// Inherited slots plus `methods.len()`.
    pub total_method_count: u32,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

// ---------------------------------------------------------------------------
// Constants and macros
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppConstant {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CppType,
    pub value: String,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppGuid {
    pub name: String,
    pub guid: Guid,
    #[serde(default, skip_serializing_if = "DocInfo::is_empty")]
    pub doc: DocInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppDefine {
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// CppDecl
// ---------------------------------------------------------------------------

/// One top-level declaration of an include.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CppDecl {
    Enum(CppEnum),
    Struct(CppStruct),
    Interface(CppInterface),
    Function(CppFunction),
    Constant(CppConstant),
    Guid(CppGuid),
    Define(CppDefine),
}

impl CppDecl {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Enum(e) => &e.name,
            Self::Struct(s) => &s.name,
            Self::Interface(i) => &i.name,
            Self::Function(f) => &f.name,
            Self::Constant(c) => &c.name,
            Self::Guid(g) => &g.name,
            Self::Define(d) => &d.name,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Enum(_) => "enum",
            Self::Struct(s) if s.is_union => "union",
            Self::Struct(_) => "struct",
            Self::Interface(_) => "interface",
            Self::Function(_) => "function",
            Self::Constant(_) => "constant",
            Self::Guid(_) => "guid",
            Self::Define(_) => "define",
        }
    }

    /// Documentation slot, if this kind carries one. Macro defines do not.
    pub fn doc_mut(&mut self) -> Option<&mut DocInfo> {
        match self {
            Self::Enum(e) => Some(&mut e.doc),
            Self::Struct(s) => Some(&mut s.doc),
            Self::Interface(i) => Some(&mut i.doc),
            Self::Function(f) => Some(&mut f.doc),
            Self::Constant(c) => Some(&mut c.doc),
            Self::Guid(g) => Some(&mut g.doc),
            Self::Define(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_reports_union_kind() {
        let decl = CppDecl::Struct(CppStruct {
            name: "VALUE".into(),
            is_union: true,
            ..CppStruct::default()
        });
        assert_eq!(decl.kind(), "union");
        assert_eq!(decl.name(), "VALUE");
    }

    #[test]
    fn define_has_no_doc_slot() {
        let mut decl = CppDecl::Define(CppDefine {
            name: "FOO".into(),
            value: "1".into(),
        });
        assert!(decl.doc_mut().is_none());
    }
}
