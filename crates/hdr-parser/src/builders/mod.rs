//! Declaration builders: castxml elements to model declarations.
//!
//! One [`DeclBuilder`] lives for one XML document. It owns the per-run state
//! that naming and vtable layout depend on: anonymous-enum counters per
//! include, the interface cache keyed by element id, and nested structs that
//! were named while building their parent.

mod enums;
mod functions;
mod interfaces;
mod structs;
mod variables;

pub use interfaces::reorder_overloads;
pub use variables::rewrite_initializer;

use std::collections::{BTreeMap, HashMap, HashSet};

use hdr_core::{CppDecl, CppInclude, CppInterface, CppStruct, CppType};
use roxmltree::Node;

use crate::error::ParserError;
use crate::index::{DeclIndex, is_anonymous, tags};
use crate::logger::Logger;
use crate::resolver::TypeResolver;

pub struct DeclBuilder<'r, 'a, 'input> {
    index: &'r DeclIndex<'a, 'input>,
    resolver: TypeResolver<'r, 'a, 'input>,
    bindings: &'r BTreeMap<String, String>,
    log: &'r mut Logger,
    interfaces: HashMap<&'a str, CppInterface>,
    in_progress: HashSet<&'a str>,
    enum_counters: HashMap<String, u32>,
    /// Named structs declared inside the record being built.
    nested: Vec<CppStruct>,
}

impl<'r, 'a, 'input> DeclBuilder<'r, 'a, 'input> {
    pub fn new(
        index: &'r DeclIndex<'a, 'input>,
        bindings: &'r BTreeMap<String, String>,
        log: &'r mut Logger,
    ) -> Self {
        Self {
            index,
            resolver: TypeResolver::new(index, bindings),
            bindings,
            log,
            interfaces: HashMap::new(),
            in_progress: HashSet::new(),
            enum_counters: HashMap::new(),
            nested: Vec::new(),
        }
    }

    /// Build every top-level declaration of one include, keeping those `attached` accepts.
    ///
    /// Nested structs named while building a kept record are emitted right before it.
    ///
    /// # Errors
    /// Propagates the fatal resolution errors of [`TypeResolver::resolve`].
    pub fn build_include(
        &mut self,
        include_id: &str,
        attached: impl Fn(&str) -> bool,
    ) -> Result<CppInclude, ParserError> {
        let mut include = CppInclude::new(include_id);

        for node in self.index.elements_in_include(include_id) {
            let location = self.index.location_of(node);
            let pushed = location.is_some();
            if let Some(location) = location {
                self.log.push_location(location);
            }
            let built = self.build_decl(node, include_id);
            if pushed {
                self.log.pop_location();
            }
            let nested = std::mem::take(&mut self.nested);

            let Some(decl) = built? else {
                continue;
            };
            if !attached(decl.name()) {
                continue;
            }
            include
                .decls
                .extend(nested.into_iter().map(CppDecl::Struct));
            include.push(decl);
        }

        Ok(include)
    }

    fn build_decl(
        &mut self,
        node: Node<'a, 'input>,
        include_id: &str,
    ) -> Result<Option<CppDecl>, ParserError> {
        match node.tag_name().name() {
            tags::ENUMERATION => Ok(Some(CppDecl::Enum(self.build_enum(node, include_id)))),
            tag @ (tags::STRUCT | tags::CLASS | tags::UNION) => {
                if node.attribute("incomplete") == Some("1") || is_anonymous(self.index.name_of(node)) {
                    return Ok(None);
                }
                if tag != tags::UNION && self.is_interface(node)? {
                    return Ok(Some(CppDecl::Interface(self.build_interface(node)?)));
                }
                Ok(Some(CppDecl::Struct(self.build_struct(node, None, 0)?)))
            }
            tags::FUNCTION => Ok(Some(CppDecl::Function(self.build_function(node)?))),
            tags::VARIABLE => self.build_variable(node),
            _ => Ok(None),
        }
    }

    fn resolve(&mut self, type_id: &str) -> Result<CppType, ParserError> {
        self.resolver.resolve(type_id, self.log)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use hdr_core::CppInclude;
    use roxmltree::Document;

    use super::DeclBuilder;
    use crate::index::DeclIndex;
    use crate::logger::Logger;

    /// Wrap declarations in a castxml document with one `File` (`f1`, `/sdk/widget.h`).
    pub fn castxml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<GCC_XML>
  <Namespace id="_ns" name="::"/>
  <File id="f1" name="/sdk/widget.h"/>
{body}
</GCC_XML>"#
        )
    }

    /// Build the `widget` include of `xml`, keeping everything.
    pub fn build_widget(xml: &str, bindings: &BTreeMap<String, String>) -> (CppInclude, Logger) {
        let doc = Document::parse(xml).expect("xml");
        let index = DeclIndex::build(&doc);
        let mut log = Logger::new();
        let include = DeclBuilder::new(&index, bindings, &mut log)
            .build_include("widget", |_| true)
            .expect("include builds");
        (include, log)
    }
}
