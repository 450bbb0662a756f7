use hdr_core::{CppEnum, CppEnumItem};
use roxmltree::Node;

use super::DeclBuilder;
use crate::headers::ENUM_ITEM_SUFFIX;
use crate::index::{is_anonymous, tags};

impl<'a, 'input> DeclBuilder<'_, 'a, 'input> {
    /// Anonymous enums are named `<INCLUDE>_ENUM_<n>`, counting per include from zero.
    pub(crate) fn build_enum(&mut self, node: Node<'a, 'input>, include_id: &str) -> CppEnum {
        let declared = self.index.name_of(node);
        let name = if is_anonymous(declared) {
            let counter = self.enum_counters.entry(include_id.to_string()).or_insert(0);
            let name = format!("{}_ENUM_{counter}", include_id.to_ascii_uppercase());
            *counter += 1;
            name
        } else {
            declared.to_string()
        };

        let items = node
            .children()
            .filter(|child| child.has_tag_name(tags::ENUM_VALUE))
            .map(|item| {
                let raw = item.attribute("name").unwrap_or("");
                CppEnumItem {
                    name: raw.strip_suffix(ENUM_ITEM_SUFFIX).unwrap_or(raw).to_string(),
                    value: item.attribute("init").unwrap_or("").to_string(),
                    ..CppEnumItem::default()
                }
            })
            .collect();

        CppEnum {
            name,
            items,
            ..CppEnum::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use hdr_core::CppDecl;
    use pretty_assertions::assert_eq;

    use crate::builders::test_support::{build_widget, castxml};

    #[test]
    fn anonymous_enums_are_numbered_per_include() {
        let xml = castxml(
            r#"  <Enumeration id="_1" name="" context="_ns" file="f1" line="1">
    <EnumValue name="A" init="0"/>
  </Enumeration>
  <Enumeration id="_2" name="COLOR" context="_ns" file="f1" line="2">
    <EnumValue name="RED" init="1"/>
  </Enumeration>
  <Enumeration id="_3" name="._7" context="_ns" file="f1" line="3">
    <EnumValue name="B" init="2"/>
  </Enumeration>"#,
        );
        let (include, _) = build_widget(&xml, &BTreeMap::new());
        let names: Vec<_> = include.decls.iter().map(CppDecl::name).collect();
        assert_eq!(names, vec!["WIDGET_ENUM_0", "COLOR", "WIDGET_ENUM_1"]);
    }

    #[test]
    fn macro_item_suffix_is_stripped() {
        let xml = castxml(
            r#"  <Enumeration id="_1" name="WIDGET_ERROR" context="_ns" file="f1" line="1">
    <EnumValue name="WIDGET_ERROR_BUSY__hdr_enumitem__" init="-2005270527"/>
    <EnumValue name="WIDGET_ERROR_LOST" init="-2005270526"/>
  </Enumeration>"#,
        );
        let (include, _) = build_widget(&xml, &BTreeMap::new());
        let e = include.enums().next().expect("enum");
        assert_eq!(e.items[0].name, "WIDGET_ERROR_BUSY");
        assert_eq!(e.items[0].value, "-2005270527");
        assert_eq!(e.items[1].name, "WIDGET_ERROR_LOST");
    }
}
