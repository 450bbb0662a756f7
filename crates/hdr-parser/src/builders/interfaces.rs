use hdr_core::{CppInterface, CppMethod};
use roxmltree::Node;

use super::DeclBuilder;
use crate::annotations::Annotations;
use crate::error::ParserError;
use crate::index::{required, tags};

/// Group overloads the way the MSVC ABI lays them out in the vtable.
///
/// A method whose name was already seen is moved right after the run of
/// same-named methods that starts at the first occurrence.
#[must_use]
pub fn reorder_overloads(methods: Vec<CppMethod>) -> Vec<CppMethod> {
    let mut ordered: Vec<CppMethod> = Vec::with_capacity(methods.len());
    for method in methods {
        match ordered.iter().position(|m| m.name == method.name) {
            Some(first) => {
                let end = ordered[first..]
                    .iter()
                    .position(|m| m.name != method.name)
                    .map_or(ordered.len(), |run| first + run);
                ordered.insert(end, method);
            }
            None => ordered.push(method),
        }
    }
    ordered
}

/// Whether a binding target can stand in for a COM base interface.
fn is_interface_like(target: &str) -> bool {
    let last = target.rsplit(['.', ':']).next().unwrap_or(target);
    let mut chars = last.chars();
    let i_prefixed = chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase());
    i_prefixed || last.ends_with("ComObject") || last.ends_with("Callback")
}

fn base_ids<'a>(node: Node<'a, '_>) -> Vec<&'a str> {
    if let Some(bases) = node.attribute("bases") {
        return bases
            .split_whitespace()
            .map(|base| base.rsplit_once(':').map_or(base, |(_, id)| id))
            .collect();
    }
    node.children()
        .filter(|child| child.has_tag_name(tags::BASE))
        .filter_map(|child| child.attribute("type"))
        .collect()
}

impl<'a, 'input> DeclBuilder<'_, 'a, 'input> {
    /// Records with a virtual method, or flagged abstract, are COM-style interfaces.
    pub(crate) fn is_interface(&self, node: Node<'a, 'input>) -> Result<bool, ParserError> {
        if node.attribute("abstract") == Some("1") {
            return Ok(true);
        }
        Ok(self
            .index
            .members_of(node)?
            .iter()
            .any(|m| m.has_tag_name(tags::METHOD) && m.attribute("virtual") == Some("1")))
    }

    /// Build an interface and, first, its base chain.
    ///
    /// Results are cached by element id so a base shared by several
    /// interfaces is built once.
    pub(crate) fn build_interface(&mut self, node: Node<'a, 'input>) -> Result<CppInterface, ParserError> {
        let id = required(node, "id")?;
        if let Some(cached) = self.interfaces.get(id) {
            return Ok(cached.clone());
        }

        let name = self.index.name_of(node).to_string();
        self.log.push_context(format!("Interface:[{name}]"));
        self.in_progress.insert(id);
        let built = self.build_interface_body(node, name);
        self.in_progress.remove(id);
        self.log.pop_context();

        let interface = built?;
        self.interfaces.insert(id, interface.clone());
        Ok(interface)
    }

    fn build_interface_body(&mut self, node: Node<'a, 'input>, name: String) -> Result<CppInterface, ParserError> {
        let mut interface = CppInterface {
            name,
            ..CppInterface::default()
        };
        if let Some(attributes) = node.attribute("attributes") {
            Annotations::parse(attributes).apply_to_interface(&mut interface);
        }

        let bases = base_ids(node);
        if bases.len() > 1 {
            self.log.warning(format!(
                "{} has {} bases; only the first contributes vtable slots",
                interface.name,
                bases.len()
            ));
        }

        let mut inherited = 0;
        if let Some(&base_id) = bases.first() {
            if self.in_progress.contains(base_id) {
                self.log.error(format!("Cyclic inheritance through {base_id}"));
            } else {
                let base_node = self.index.peel_elaborated(self.index.node(base_id)?);
                let base = self.build_interface(base_node)?;
                self.check_base_binding(&base.name);
                inherited = base.total_method_count;
                interface.parent_name = Some(base.name);
            }
        }

        let mut methods = Vec::new();
        for member in self.index.members_of(node)? {
            let slot = member.has_tag_name(tags::METHOD)
                && member.attribute("pure_virtual") == Some("1")
                && member.attribute("overrides").is_none_or(str::is_empty);
            if slot {
                methods.push(self.build_method(member)?);
            }
        }

        let mut methods = reorder_overloads(methods);
        let mut offset = inherited;
        for method in &mut methods {
            method.offset = offset;
            offset += 1;
        }
        interface.total_method_count = offset;
        interface.methods = methods;
        Ok(interface)
    }

    fn build_method(&mut self, node: Node<'a, 'input>) -> Result<CppMethod, ParserError> {
        let name = required(node, "name")?.to_string();
        self.log.push_context(format!("Method:[{name}]"));
        let signature = self.build_signature(node);
        self.log.pop_context();

        Ok(CppMethod {
            name,
            signature: signature?,
            ..CppMethod::default()
        })
    }

    fn check_base_binding(&mut self, base: &str) {
        if let Some(target) = self.bindings.get(base) {
            if !is_interface_like(target) {
                self.log.error(format!(
                    "Base interface {base} is bound to {target}, which is not an interface type"
                ));
            }
        }
    }
}
