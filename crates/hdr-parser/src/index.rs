//! Lookup tables over a castxml (gccxml-compatible) XML document.
//!
//! castxml emits every declaration as a flat child of the root element and
//! links them through `id`, `type`, `context` and `file` attributes. The index
//! turns those links into maps so builders never scan the document.

use std::collections::HashMap;

use hdr_config::include_id_of;
use roxmltree::{Document, Node};

use crate::error::ParserError;
use crate::logger::Location;

/// castxml element names the resolver understands.
pub mod tags {
    pub const FILE: &str = "File";
    pub const NAMESPACE: &str = "Namespace";
    pub const FUNDAMENTAL_TYPE: &str = "FundamentalType";
    pub const ENUMERATION: &str = "Enumeration";
    pub const ENUM_VALUE: &str = "EnumValue";
    pub const STRUCT: &str = "Struct";
    pub const CLASS: &str = "Class";
    pub const UNION: &str = "Union";
    pub const FIELD: &str = "Field";
    pub const TYPEDEF: &str = "Typedef";
    pub const POINTER_TYPE: &str = "PointerType";
    pub const ARRAY_TYPE: &str = "ArrayType";
    pub const REFERENCE_TYPE: &str = "ReferenceType";
    pub const CV_QUALIFIED_TYPE: &str = "CvQualifiedType";
    pub const FUNCTION_TYPE: &str = "FunctionType";
    pub const ELABORATED_TYPE: &str = "ElaboratedType";
    pub const FUNCTION: &str = "Function";
    pub const METHOD: &str = "Method";
    pub const ARGUMENT: &str = "Argument";
    pub const ELLIPSIS: &str = "Ellipsis";
    pub const VARIABLE: &str = "Variable";
    pub const BASE: &str = "Base";
}

/// Names castxml gives to unnamed structs, unions and enums.
#[must_use]
pub fn is_anonymous(name: &str) -> bool {
    name.is_empty() || name.starts_with('$') || name.starts_with("._") || name.starts_with("__anon")
}

fn is_record_or_enum(node: Node<'_, '_>) -> bool {
    matches!(
        node.tag_name().name(),
        tags::STRUCT | tags::CLASS | tags::UNION | tags::ENUMERATION
    )
}

/// Attribute that castxml always writes on this element kind.
///
/// # Errors
/// Returns `ParserError::MissingAttribute` when it is absent.
pub fn required<'a>(node: Node<'a, '_>, attribute: &str) -> Result<&'a str, ParserError> {
    node.attribute(attribute)
        .ok_or_else(|| ParserError::MissingAttribute {
            id: node.attribute("id").unwrap_or("?").to_string(),
            tag: node.tag_name().name().to_string(),
            attribute: attribute.to_string(),
        })
}

pub struct DeclIndex<'a, 'input> {
    by_id: HashMap<&'a str, Node<'a, 'input>>,
    by_file: HashMap<&'a str, Vec<Node<'a, 'input>>>,
    by_context: HashMap<&'a str, Vec<Node<'a, 'input>>>,
    /// `File` elements as (id, path), in document order.
    files: Vec<(&'a str, &'a str)>,
    /// Anonymous record/enum id -> name of the first typedef naming it.
    renamed: HashMap<&'a str, &'a str>,
}

impl<'a, 'input> DeclIndex<'a, 'input> {
    /// Index every element of the document in one pass, then apply typedef naming.
    #[must_use]
    pub fn build(doc: &'a Document<'input>) -> Self {
        let mut index = Self {
            by_id: HashMap::new(),
            by_file: HashMap::new(),
            by_context: HashMap::new(),
            files: Vec::new(),
            renamed: HashMap::new(),
        };
        let mut typedefs = Vec::new();

        for node in doc.root_element().children().filter(Node::is_element) {
            let tag = node.tag_name().name();
            if let Some(id) = node.attribute("id") {
                index.by_id.insert(id, node);
                if tag == tags::FILE {
                    if let Some(path) = node.attribute("name") {
                        index.files.push((id, path));
                    }
                }
            }
            if let Some(file) = node.attribute("file") {
                index.by_file.entry(file).or_default().push(node);
            }
            if let Some(context) = node.attribute("context") {
                index.by_context.entry(context).or_default().push(node);
            }
            if tag == tags::TYPEDEF {
                typedefs.push(node);
            }
        }

        for typedef in typedefs {
            index.name_from_typedef(typedef);
        }
        index
    }

    fn name_from_typedef(&mut self, typedef: Node<'a, 'input>) {
        let Some(name) = typedef.attribute("name") else {
            return;
        };
        let Some(target) = typedef.attribute("type").and_then(|id| self.get(id)) else {
            return;
        };
        let target = self.peel_elaborated(target);
        if !is_record_or_enum(target) || !is_anonymous(target.attribute("name").unwrap_or("")) {
            return;
        }
        if let Some(id) = target.attribute("id") {
            self.renamed.entry(id).or_insert(name);
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Node<'a, 'input>> {
        self.by_id.get(id).copied()
    }

    /// Element with this id.
    ///
    /// # Errors
    /// Returns `ParserError::UnknownId`; castxml output never references a missing id.
    pub fn node(&self, id: &str) -> Result<Node<'a, 'input>, ParserError> {
        self.get(id)
            .ok_or_else(|| ParserError::UnknownId(id.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Declared name, with typedef naming of anonymous types applied.
    #[must_use]
    pub fn name_of(&self, node: Node<'a, 'input>) -> &'a str {
        node.attribute("id")
            .and_then(|id| self.renamed.get(id).copied())
            .or_else(|| node.attribute("name"))
            .unwrap_or("")
    }

    /// Follow `ElaboratedType` wrappers to the element they name.
    #[must_use]
    pub fn peel_elaborated(&self, mut node: Node<'a, 'input>) -> Node<'a, 'input> {
        while node.tag_name().name() == tags::ELABORATED_TYPE {
            match node.attribute("type").and_then(|id| self.get(id)) {
                Some(next) => node = next,
                None => break,
            }
        }
        node
    }

    /// Elements whose `context` is `id`, in document order.
    #[must_use]
    pub fn children_of(&self, id: &str) -> &[Node<'a, 'input>] {
        self.by_context.get(id).map_or(&[], Vec::as_slice)
    }

    /// Members of a record in declaration order.
    ///
    /// Uses the `members` attribute when castxml wrote one, otherwise the
    /// context children.
    ///
    /// # Errors
    /// Returns `ParserError::UnknownId` when a listed member is missing.
    pub fn members_of(&self, node: Node<'a, 'input>) -> Result<Vec<Node<'a, 'input>>, ParserError> {
        if let Some(members) = node.attribute("members") {
            return members.split_whitespace().map(|id| self.node(id)).collect();
        }
        Ok(node
            .attribute("id")
            .map(|id| self.children_of(id).to_vec())
            .unwrap_or_default())
    }

    #[must_use]
    pub fn file_path(&self, file_id: &str) -> Option<&'a str> {
        self.files
            .iter()
            .find(|(id, _)| *id == file_id)
            .map(|(_, path)| *path)
    }

    /// Source location of a declaration, if castxml recorded one.
    #[must_use]
    pub fn location_of(&self, node: Node<'a, 'input>) -> Option<Location> {
        let file = self.file_path(node.attribute("file")?)?;
        let line = node.attribute("line").and_then(|l| l.parse().ok()).unwrap_or(0);
        Some(Location::new(file, line, 0))
    }

    /// Whether the element is declared at namespace scope rather than inside a record.
    #[must_use]
    pub fn is_top_level(&self, node: Node<'a, 'input>) -> bool {
        node.attribute("context")
            .and_then(|ctx| self.get(ctx))
            .is_none_or(|ctx| ctx.tag_name().name() == tags::NAMESPACE)
    }

    /// Top-level elements declared in any file whose include id matches, in document order.
    #[must_use]
    pub fn elements_in_include(&self, include_id: &str) -> Vec<Node<'a, 'input>> {
        let mut nodes: Vec<_> = self
            .files
            .iter()
            .filter(|(_, path)| include_id_of(path) == include_id)
            .filter_map(|(id, _)| self.by_file.get(id))
            .flatten()
            .copied()
            .filter(|node| self.is_top_level(*node))
            .collect();
        nodes.sort_by_key(|node| node.range().start);
        nodes
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const XML: &str = r#"<?xml version="1.0"?>
<GCC_XML>
  <Namespace id="_1" name="::" members="_3 _4 _6"/>
  <File id="f1" name="/sdk/Widget.h"/>
  <File id="f2" name="/usr/include/stdio.h"/>
  <Struct id="_3" name="" context="_1" file="f1" line="4" members="_5"/>
  <Typedef id="_4" name="WIDGET_DESC" type="_3" context="_1" file="f1" line="7"/>
  <Field id="_5" name="size" type="_7" context="_3" file="f1" line="5"/>
  <Typedef id="_6" name="WIDGET_DESC_ALIAS" type="_3" context="_1" file="f1" line="8"/>
  <FundamentalType id="_7" name="int"/>
  <Function id="_8" name="printf" returns="_7" context="_1" file="f2" line="1"/>
</GCC_XML>"#;

    #[test]
    fn first_typedef_names_anonymous_struct() {
        let doc = Document::parse(XML).expect("xml");
        let index = DeclIndex::build(&doc);
        let node = index.node("_3").expect("struct");
        assert_eq!(index.name_of(node), "WIDGET_DESC");
    }

    #[test]
    fn unknown_id_is_an_error() {
        let doc = Document::parse(XML).expect("xml");
        let index = DeclIndex::build(&doc);
        assert!(matches!(index.node("_99"), Err(ParserError::UnknownId(id)) if id == "_99"));
    }

    #[test]
    fn context_children_and_members_agree() {
        let doc = Document::parse(XML).expect("xml");
        let index = DeclIndex::build(&doc);
        let record = index.node("_3").expect("struct");
        let ids: Vec<_> = index
            .members_of(record)
            .expect("members")
            .iter()
            .filter_map(|n| n.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["_5"]);
        assert_eq!(index.children_of("_3").len(), 1);
    }

    #[test]
    fn include_lookup_uses_lowercase_stem_and_skips_nested() {
        let doc = Document::parse(XML).expect("xml");
        let index = DeclIndex::build(&doc);
        let ids: Vec<_> = index
            .elements_in_include("widget")
            .iter()
            .filter_map(|n| n.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["_3", "_4", "_6"]);
        assert_eq!(index.elements_in_include("stdio").len(), 1);
    }

    #[test]
    fn location_comes_from_file_table() {
        let doc = Document::parse(XML).expect("xml");
        let index = DeclIndex::build(&doc);
        let field = index.node("_5").expect("field");
        assert_eq!(index.location_of(field), Some(Location::new("/sdk/Widget.h", 5, 0)));
    }

    #[test]
    fn anonymous_name_markers() {
        assert!(is_anonymous(""));
        assert!(is_anonymous("$_12"));
        assert!(is_anonymous("._5"));
        assert!(is_anonymous("__anon_struct"));
        assert!(!is_anonymous("WIDGET"));
    }
}
