//! Type chain resolution.
//!
//! A castxml type reference is a chain of wrapper elements (typedef, pointer,
//! array, reference, cv-qualifier) ending in a terminal type. Walking it
//! accumulates the markers of a [`CppType`].

use std::collections::BTreeMap;

use hdr_core::CppType;

use crate::error::ParserError;
use crate::index::{DeclIndex, required, tags};
use crate::logger::Logger;

/// Terminal name given to function types; they are not decomposed further.
pub const FUNCTION_TYPE_NAME: &str = "__function__stdcall";

pub struct TypeResolver<'r, 'a, 'input> {
    index: &'r DeclIndex<'a, 'input>,
    bindings: &'r BTreeMap<String, String>,
}

impl<'r, 'a, 'input> TypeResolver<'r, 'a, 'input> {
    #[must_use]
    pub const fn new(index: &'r DeclIndex<'a, 'input>, bindings: &'r BTreeMap<String, String>) -> Self {
        Self { index, bindings }
    }

    /// Resolve the type element `type_id` into a descriptor.
    ///
    /// # Errors
    /// Returns `ParserError::UnknownId` for a dangling reference and
    /// `ParserError::UnsupportedTypeTag` for an element kind outside the chain grammar.
    pub fn resolve(&self, type_id: &str, log: &mut Logger) -> Result<CppType, ParserError> {
        let mut ty = CppType::default();
        let mut node = self.index.node(type_id)?;

        loop {
            let next = match node.tag_name().name() {
                tags::FUNDAMENTAL_TYPE => {
                    ty.type_name = normalize_fundamental(required(node, "name")?, log);
                    break;
                }
                tags::ENUMERATION | tags::STRUCT | tags::CLASS | tags::UNION => {
                    ty.type_name = self.index.name_of(node).to_string();
                    break;
                }
                tags::TYPEDEF => {
                    let name = self.index.name_of(node);
                    if self.bindings.contains_key(name) {
                        ty.type_name = name.to_string();
                        break;
                    }
                    required(node, "type")?
                }
                tags::POINTER_TYPE => {
                    ty.pointer.push('*');
                    required(node, "type")?
                }
                tags::REFERENCE_TYPE => {
                    ty.pointer.push('&');
                    required(node, "type")?
                }
                tags::ARRAY_TYPE => {
                    ty.is_array = true;
                    let max = node.attribute("max").unwrap_or("");
                    match array_dimension(max) {
                        Some(dimension) => ty.array_dimensions.push(dimension),
                        None => log.warning(format!("Array without a usable bound (max=\"{max}\")")),
                    }
                    required(node, "type")?
                }
                tags::CV_QUALIFIED_TYPE => {
                    if node.attribute("const") == Some("1") {
                        ty.is_const = true;
                    }
                    required(node, "type")?
                }
                tags::ELABORATED_TYPE => required(node, "type")?,
                tags::FUNCTION_TYPE => {
                    ty.type_name = FUNCTION_TYPE_NAME.to_string();
                    break;
                }
                other => {
                    return Err(ParserError::UnsupportedTypeTag {
                        tag: other.to_string(),
                        id: node.attribute("id").unwrap_or("?").to_string(),
                    });
                }
            };
            node = self.index.node(next)?;
        }

        Ok(ty)
    }
}

/// castxml reports the highest valid index with an unsigned suffix (`"9u"`); the
/// dimension is one more.
#[must_use]
pub fn array_dimension(max: &str) -> Option<u32> {
    let digits = max.trim().trim_end_matches(|c: char| !c.is_ascii_digit());
    digits.parse::<u32>().ok().map(|n| n.saturating_add(1))
}

/// Canonical short name for a C fundamental type phrase.
///
/// `long` and `short` are counted, `unsigned` becomes a prefix and `int` is
/// implied when only modifiers are present.
pub fn normalize_fundamental(phrase: &str, log: &mut Logger) -> String {
    let mut longs = 0;
    let mut shorts = 0;
    let mut unsigned = false;
    let mut base = "";

    for word in phrase.split_whitespace() {
        match word {
            "unsigned" => unsigned = true,
            "signed" => {}
            "long" => longs += 1,
            "short" => shorts += 1,
            "int" | "char" | "wchar_t" | "char8_t" | "char16_t" | "char32_t" | "bool" | "float"
            | "double" | "void" | "__int128" => base = word,
            unknown => log.error(format!(
                "Unhandled word '{unknown}' in fundamental type '{phrase}'"
            )),
        }
    }

    let name = if longs == 1 && base == "double" {
        "long double"
    } else if longs == 2 {
        "longlong"
    } else if shorts == 1 {
        "short"
    } else if base.is_empty() {
        "int"
    } else {
        base
    };

    if unsigned {
        format!("unsigned {name}")
    } else {
        name.to_string()
    }
}
