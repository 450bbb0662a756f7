use hdr_core::{CppFunction, CppParameter, CppSignature, ParamFlags};
use roxmltree::Node;

use super::DeclBuilder;
use crate::annotations::Annotations;
use crate::error::ParserError;
use crate::index::{required, tags};

impl<'a, 'input> DeclBuilder<'_, 'a, 'input> {
    pub(crate) fn build_function(&mut self, node: Node<'a, 'input>) -> Result<CppFunction, ParserError> {
        let name = required(node, "name")?.to_string();
        self.log.push_context(format!("Function:[{name}]"));
        let signature = self.build_signature(node);
        self.log.pop_context();

        Ok(CppFunction {
            name,
            signature: signature?,
            ..CppFunction::default()
        })
    }

    /// Return type, calling convention, parameters and varargs of a function or method.
    pub(crate) fn build_signature(&mut self, node: Node<'a, 'input>) -> Result<CppSignature, ParserError> {
        let mut signature = CppSignature {
            return_type: self.resolve(required(node, "returns")?)?,
            ..CppSignature::default()
        };
        if let Some(attributes) = node.attribute("attributes") {
            Annotations::parse(attributes).apply_to_signature(&mut signature);
        }

        let mut ordinal = 0;
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                tags::ARGUMENT => {
                    let parameter = self.build_parameter(child, ordinal)?;
                    signature.parameters.push(parameter);
                    ordinal += 1;
                }
                tags::ELLIPSIS => signature.is_variadic = true,
                _ => {}
            }
        }

        Ok(signature)
    }

    fn build_parameter(&mut self, node: Node<'a, 'input>, ordinal: usize) -> Result<CppParameter, ParserError> {
        let name = node
            .attribute("name")
            .filter(|name| !name.is_empty())
            .map_or_else(|| format!("arg{ordinal}"), str::to_string);

        let mut parameter = CppParameter {
            ty: self.resolve(required(node, "type")?)?,
            name,
            ..CppParameter::default()
        };
        if let Some(attributes) = node.attribute("attributes") {
            Annotations::parse(attributes).apply_to_parameter(&mut parameter);
        }
        if !parameter.attributes.has_direction() {
            parameter.attributes |= ParamFlags::IN;
        }
        Ok(parameter)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use hdr_core::{CallingConvention, ParamFlags};
    use pretty_assertions::assert_eq;

    use crate::builders::test_support::{build_widget, castxml};

    #[test]
    fn parameters_get_names_types_and_directions() {
        let xml = castxml(
            r#"  <FundamentalType id="_int" name="int"/>
  <FundamentalType id="_void" name="void"/>
  <PointerType id="_pv" type="_void"/>
  <PointerType id="_ppv" type="_pv"/>
  <Function id="_1" name="CreateWidget" returns="_int" context="_ns" file="f1" line="1" attributes="__stdcall__">
    <Argument name="flags" type="_int"/>
    <Argument type="_int"/>
    <Argument name="out" type="_ppv" attributes="annotate(SAL_valid) annotate(SAL_post) annotate(SAL_writableTo(elementCount(1))) annotate(SAL_pre)"/>
  </Function>"#,
        );
        let (include, _) = build_widget(&xml, &BTreeMap::new());
        let function = include.functions().next().expect("function");
        let sig = &function.signature;

        assert_eq!(sig.calling_convention, CallingConvention::StdCall);
        assert_eq!(sig.return_type.type_name, "int");
        let names: Vec<_> = sig.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["flags", "arg1", "out"]);
        assert_eq!(sig.parameters[0].attributes, ParamFlags::IN);
        assert_eq!(sig.parameters[2].attributes, ParamFlags::OUT);
        assert_eq!(sig.parameters[2].ty.pointer, "**");
        assert!(!sig.is_variadic);
    }

    #[test]
    fn ellipsis_marks_variadic() {
        let xml = castxml(
            r#"  <FundamentalType id="_int" name="int"/>
  <Function id="_1" name="Log" returns="_int" context="_ns" file="f1" line="1">
    <Argument name="level" type="_int"/>
    <Ellipsis/>
  </Function>"#,
        );
        let (include, _) = build_widget(&xml, &BTreeMap::new());
        let function = include.functions().next().expect("function");
        assert!(function.signature.is_variadic);
        assert_eq!(function.signature.parameters.len(), 1);
        assert_eq!(function.signature.calling_convention, CallingConvention::Unknown);
    }
}
