use std::sync::LazyLock;

use hdr_core::{CppConstant, CppDecl, CppGuid, Guid};
use regex::Regex;
use roxmltree::Node;

use super::DeclBuilder;
use crate::error::ParserError;
use crate::headers::VARIABLE_SUFFIX;
use crate::index::required;

static CAST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(\s*([A-Za-z_][\w\s:*&]*?)\s*\)(\s*)(.+)$").expect("valid regex")
});

const FUNDAMENTAL_WORDS: &[&str] = &[
    "unsigned", "signed", "long", "short", "int", "char", "wchar_t", "bool", "float", "double",
    "void",
];

static BARE_FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\.([fF])\b").expect("valid regex"));

fn is_guid_type(type_name: &str) -> bool {
    matches!(type_name, "GUID" | "_GUID")
}

/// Drop parentheses that enclose the whole expression.
fn strip_enclosing_parens(mut expr: &str) -> &str {
    loop {
        let Some(inner) = expr.strip_prefix('(').and_then(|e| e.strip_suffix(')')) else {
            return expr;
        };
        let mut depth = 0i32;
        let balanced = inner.chars().all(|c| {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            depth >= 0
        });
        if !balanced || depth != 0 {
            return expr;
        }
        expr = inner.trim();
    }
}

/// Whether `(cast)` in front of `rest` is a C cast rather than a
/// parenthesized operand.
///
/// The resolved type and fundamental type phrases are always casts. Any other
/// name is a cast unless `rest` continues with a binary operator; a sign
/// directly against the parenthesis and followed by a digit is unary.
fn is_cast(cast: &str, gap: &str, rest: &str, type_name: &str) -> bool {
    let bare = cast.trim_end_matches(['*', '&', ' ']);
    if bare == type_name || bare.split_whitespace().all(|w| FUNDAMENTAL_WORDS.contains(&w)) {
        return true;
    }
    let mut chars = rest.chars();
    match chars.next() {
        Some('|' | '&' | '^' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '?' | ':' | ',' | ')')
        | None => false,
        Some('+' | '-') => gap.is_empty() && chars.next().is_some_and(|c| c.is_ascii_digit()),
        Some(_) => true,
    }
}

/// Normalize a castxml initializer for use as a constant value.
///
/// A leading C cast is replaced by a cast to `type_name`, and float literals
/// like `1.F` become `1.0F`.
#[must_use]
pub fn rewrite_initializer(init: &str, type_name: &str) -> String {
    let expr = strip_enclosing_parens(init.trim());
    let cast = CAST_RE
        .captures(expr)
        .filter(|caps| is_cast(&caps[1], &caps[2], &caps[3], type_name));
    let (expr, recast) = match cast {
        Some(caps) => (strip_enclosing_parens(caps.get(3).map_or("", |m| m.as_str())), true),
        None => (expr, false),
    };
    let expr = BARE_FLOAT_RE.replace_all(expr, "${1}.0${2}");
    if recast {
        format!("({type_name}){expr}")
    } else {
        expr.into_owned()
    }
}

impl<'a, 'input> DeclBuilder<'_, 'a, 'input> {
    /// GUID constants become [`CppGuid`], everything else a [`CppConstant`].
    /// A GUID whose initializer does not parse is dropped with a warning.
    pub(crate) fn build_variable(&mut self, node: Node<'a, 'input>) -> Result<Option<CppDecl>, ParserError> {
        let raw = required(node, "name")?;
        let name = raw.strip_suffix(VARIABLE_SUFFIX).unwrap_or(raw).to_string();
        let ty = self.resolve(required(node, "type")?)?;
        let init = node.attribute("init").unwrap_or("");

        if is_guid_type(&ty.type_name) {
            return Ok(match Guid::parse_initializer(init) {
                Some(guid) => Some(CppDecl::Guid(CppGuid {
                    name,
                    guid,
                    doc: hdr_core::DocInfo::default(),
                })),
                None => {
                    self.log.warning(format!(
                        "Skipping GUID constant {name}: unrecognized initializer '{init}'"
                    ));
                    None
                }
            });
        }

        if init.is_empty() {
            self.log.info(format!("Skipping variable {name} without initializer"));
            return Ok(None);
        }

        let value = rewrite_initializer(init, &ty.type_name);
        Ok(Some(CppDecl::Constant(CppConstant {
            name,
            ty,
            value,
            ..CppConstant::default()
        })))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use hdr_core::Guid;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::builders::test_support::{build_widget, castxml};

    #[rstest]
    #[case("5", "int", "5")]
    #[case("(int)5", "int", "(int)5")]
    #[case("((unsigned int)(0x887A0001))", "unsigned int", "(unsigned int)0x887A0001")]
    #[case("(HRESULT)-2005270527L", "int", "(int)-2005270527L")]
    #[case("1.F", "float", "1.0F")]
    #[case("(1 << 4)", "int", "1 << 4")]
    #[case("(1.F)", "float", "1.0F")]
    #[case("(FLAG_A) | (FLAG_B)", "int", "(FLAG_A) | (FLAG_B)")]
    #[case("(WIDGET_BASE) + 1", "int", "(WIDGET_BASE) + 1")]
    #[case("(WIDGET_BASE) - 1", "int", "(WIDGET_BASE) - 1")]
    #[case("(const char *)0", "int", "(int)0")]
    fn initializers_are_normalized(#[case] init: &str, #[case] ty: &str, #[case] expected: &str) {
        assert_eq!(rewrite_initializer(init, ty), expected);
    }

    const GUIDS: &str = r#"  <Struct id="_g" name="_GUID" context="_ns" file="f2" line="1" members=""/>
  <Typedef id="_t" name="GUID" type="_g" context="_ns" file="f2" line="2"/>
  <CvQualifiedType id="_cg" type="_t" const="1"/>
  <FundamentalType id="_f" name="float"/>
  <CvQualifiedType id="_cf" type="_f" const="1"/>
  <Variable id="_1" name="IID_IWidget" type="_cg" init="{-1135593225ul, 9184u, 18784u, {150u, 218u, 51u, 171u, 175u, 89u, 53u, 236u}}" context="_ns" file="f1" line="1"/>
  <Variable id="_2" name="IID_Broken" type="_cg" init="{1, 2}" context="_ns" file="f1" line="2"/>
  <Variable id="_3" name="WIDGET_SCALE__hdr_var__" type="_cf" init="2.F" context="_ns" file="f1" line="3"/>
  <Variable id="_4" name="g_external" type="_f" context="_ns" file="f1" line="4"/>"#;

    #[test]
    fn guid_constants_parse_and_malformed_ones_are_dropped() {
        let (include, log) = build_widget(&castxml(GUIDS), &BTreeMap::new());

        let guids: Vec<_> = include.guids().collect();
        assert_eq!(guids.len(), 1);
        assert_eq!(guids[0].name, "IID_IWidget");
        assert_eq!(
            guids[0].guid,
            Guid {
                data1: -1_135_593_225,
                data2: 9184,
                data3: 18784,
                data4: [150, 218, 51, 171, 175, 89, 53, 236],
            }
        );
        assert_eq!(log.warning_count(), 1);
        assert!(!log.has_errors());
    }

    #[test]
    fn constants_lose_marker_suffix_and_fix_floats() {
        let (include, _) = build_widget(&castxml(GUIDS), &BTreeMap::new());
        let constants: Vec<_> = include.constants().collect();
        assert_eq!(constants.len(), 1);
        assert_eq!(constants[0].name, "WIDGET_SCALE");
        assert_eq!(constants[0].value, "2.0F");
        assert!(constants[0].ty.is_const);
    }
}
