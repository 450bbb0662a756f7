use hdr_core::{CppField, CppStruct};
use roxmltree::Node;

use super::DeclBuilder;
use crate::error::ParserError;
use crate::index::{is_anonymous, required, tags};

/// castxml reports alignment in bits. 4 bytes is indistinguishable from the
/// 32-bit default and is recorded as 0.
fn alignment(node: Node<'_, '_>) -> u32 {
    let bytes = node
        .attribute("align")
        .and_then(|bits| bits.parse::<u32>().ok())
        .map_or(0, |bits| bits / 8);
    if bytes == 4 { 0 } else { bytes }
}

fn nested_name(parent: &str, declared: &str, inner_index: u32) -> String {
    if is_anonymous(declared) {
        format!("{parent}_INNER_{inner_index}")
    } else {
        format!("{parent}_{declared}_INNER")
    }
}

impl<'a, 'input> DeclBuilder<'_, 'a, 'input> {
    /// Build a struct or union.
    ///
    /// Offsets are field slots: each field of a struct takes the next slot,
    /// union members and bitfields stay on the current one. Records declared
    /// inline are built first; unnamed ones are flattened into this record.
    pub(crate) fn build_struct(
        &mut self,
        node: Node<'a, 'input>,
        parent: Option<&str>,
        inner_index: u32,
    ) -> Result<CppStruct, ParserError> {
        let declared = self.index.name_of(node);
        let name = match parent {
            Some(parent) => nested_name(parent, declared, inner_index),
            None => declared.to_string(),
        };
        let is_union = node.has_tag_name(tags::UNION);

        self.log.push_context(format!("Struct:[{name}]"));
        let fields = self.build_fields(node, &name, is_union);
        self.log.pop_context();

        Ok(CppStruct {
            name,
            is_union,
            align: alignment(node),
            fields: fields?,
            ..CppStruct::default()
        })
    }

    fn build_fields(
        &mut self,
        node: Node<'a, 'input>,
        name: &str,
        is_union: bool,
    ) -> Result<Vec<CppField>, ParserError> {
        let id = required(node, "id")?;
        let mut fields = Vec::new();
        let mut offset = 0u32;
        let mut inner_count = 0u32;

        for member in self.index.members_of(node)? {
            if !member.has_tag_name(tags::FIELD) {
                continue;
            }
            let field_name = member.attribute("name").unwrap_or("");
            let inline = self.inline_record(required(member, "type")?, id)?;

            if let Some((record, wrapped)) = inline {
                let inner = self.build_struct(record, Some(name), inner_count)?;
                inner_count += 1;

                if field_name.is_empty() && !wrapped {
                    let mut last = offset;
                    for mut sub in inner.fields {
                        sub.offset += offset;
                        last = sub.offset;
                        fields.push(sub);
                    }
                    if !is_union {
                        offset = last + 1;
                    }
                    continue;
                }

                let mut field = self.build_field(member, field_name, offset)?;
                field.ty.type_name.clone_from(&inner.name);
                self.nested.push(inner);
                fields.push(field);
            } else {
                fields.push(self.build_field(member, field_name, offset)?);
            }

            let is_bit_field = fields.last().is_some_and(|f| f.is_bit_field);
            if !is_union && !is_bit_field {
                offset += 1;
            }
        }

        Ok(fields)
    }

    /// Record declared inside `parent_id` that a field's type names, seen
    /// through arrays, pointers and qualifiers. The flag is set when any such
    /// wrapper was crossed.
    fn inline_record(
        &self,
        type_id: &str,
        parent_id: &str,
    ) -> Result<Option<(Node<'a, 'input>, bool)>, ParserError> {
        let mut node = self.index.node(type_id)?;
        let mut wrapped = false;
        loop {
            match node.tag_name().name() {
                tags::ELABORATED_TYPE => {}
                tags::ARRAY_TYPE | tags::POINTER_TYPE | tags::CV_QUALIFIED_TYPE => wrapped = true,
                tags::STRUCT | tags::CLASS | tags::UNION
                    if node.attribute("context") == Some(parent_id) =>
                {
                    return Ok(Some((node, wrapped)));
                }
                _ => return Ok(None),
            }
            node = self.index.node(required(node, "type")?)?;
        }
    }

    fn build_field(
        &mut self,
        member: Node<'a, 'input>,
        name: &str,
        offset: u32,
    ) -> Result<CppField, ParserError> {
        let ty = self.resolve(required(member, "type")?)?;
        let bit_width = member.attribute("bits").and_then(|bits| bits.parse::<u32>().ok());
        Ok(CppField {
            name: name.to_string(),
            ty,
            offset,
            is_bit_field: bit_width.is_some(),
            bit_width: bit_width.unwrap_or(0),
            ..CppField::default()
        })
    }
}
