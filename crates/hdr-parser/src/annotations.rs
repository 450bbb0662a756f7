//! Decoding of castxml `attributes="..."` strings.
//!
//! Headers compiled with SAL annotations mapped to `__attribute__((annotate(...)))`
//! carry parameter direction and buffer shape in those strings; calling
//! conventions and `uuid(...)` show up there too. castxml writes them in
//! reverse declaration order, so tokens are processed back to front through
//! an ordered rule table. The first matching rule consumes the token.

use hdr_core::{CallingConvention, CppInterface, CppParameter, CppSignature, ParamFlags};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    None,
    Pre,
    Post,
}

#[derive(Debug, Default)]
struct SalState {
    phase: Phase,
    has_writable: bool,
    flags: ParamFlags,
    calling_convention: Option<CallingConvention>,
    guid: Option<String>,
}

struct Rule {
    matches: fn(&SalState, &str) -> bool,
    apply: fn(&mut SalState, &str),
}

/// Evaluated in order; earlier rules take precedence.
const RULES: &[Rule] = &[
    Rule {
        matches: |_, t| t == "SAL_pre",
        apply: |s, _| s.phase = Phase::Pre,
    },
    Rule {
        matches: |_, t| t == "SAL_post",
        apply: |s, _| s.phase = Phase::Post,
    },
    Rule {
        matches: |s, t| t == "SAL_valid" && s.phase == Phase::Post,
        apply: |s, _| s.flags |= ParamFlags::OUT,
    },
    Rule {
        matches: |_, t| t == "SAL_maybenull" || (t.starts_with("SAL_null") && t.contains("maybe")),
        apply: |s, _| s.flags |= ParamFlags::OPTIONAL,
    },
    Rule {
        matches: |_, t| t.starts_with("SAL_writableTo"),
        apply: |s, t| {
            if s.phase == Phase::Pre {
                s.flags |= ParamFlags::OUT;
            }
            s.has_writable = true;
            if !is_single_element(t) {
                s.flags |= ParamFlags::BUFFER;
            }
        },
    },
    Rule {
        matches: |_, t| t.starts_with("SAL_readableTo"),
        apply: |s, t| {
            if !is_single_element(t) {
                s.flags |= ParamFlags::BUFFER;
            }
        },
    },
    Rule {
        matches: |_, t| t == "__stdcall__",
        apply: |s, _| s.calling_convention = Some(CallingConvention::StdCall),
    },
    Rule {
        matches: |_, t| t == "__cdecl__",
        apply: |s, _| s.calling_convention = Some(CallingConvention::CDecl),
    },
    Rule {
        matches: |_, t| t == "__thiscall__",
        apply: |s, _| s.calling_convention = Some(CallingConvention::ThisCall),
    },
    Rule {
        matches: |_, t| t.starts_with("uuid("),
        apply: |s, t| s.guid = Some(extract_uuid(t)),
    },
];

fn is_single_element(token: &str) -> bool {
    token.contains("elementCount(1)") || token.ends_with("(1)")
}

fn extract_uuid(token: &str) -> String {
    token
        .trim_start_matches("uuid(")
        .trim_end_matches(')')
        .trim_matches(|c| c == '"' || c == '\'' || c == '{' || c == '}')
        .to_string()
}

/// Decoded content of one attribute string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub calling_convention: Option<CallingConvention>,
    /// Final parameter direction and shape; always carries a direction bit.
    pub direction: ParamFlags,
    pub guid: Option<String>,
}

impl Annotations {
    #[must_use]
    pub fn parse(attributes: &str) -> Self {
        let mut state = SalState::default();

        for token in tokenize(attributes).iter().rev() {
            if let Some(rule) = RULES.iter().find(|rule| (rule.matches)(&state, token)) {
                (rule.apply)(&mut state, token);
            }
        }

        if !state.has_writable {
            state.flags |= ParamFlags::IN;
        }

        Self {
            calling_convention: state.calling_convention,
            direction: state.flags.normalized(),
            guid: state.guid,
        }
    }

    pub const fn apply_to_parameter(&self, parameter: &mut CppParameter) {
        parameter.attributes = self.direction;
    }

    /// Methods and functions take the calling convention.
    pub const fn apply_to_signature(&self, signature: &mut CppSignature) {
        if let Some(convention) = self.calling_convention {
            signature.calling_convention = convention;
        }
    }

    pub fn apply_to_interface(&self, interface: &mut CppInterface) {
        if let Some(guid) = &self.guid {
            interface.guid = Some(guid.clone());
        }
    }
}

/// Split an attribute string into bare tokens.
///
/// Whitespace inside parentheses is dropped first so that reflowed
/// `annotate("SAL_writableTo(elementCount( n ))")` stays one token, then
/// `annotate(...)` wrappers and quotes are removed.
fn tokenize(attributes: &str) -> Vec<String> {
    let mut compact = String::with_capacity(attributes.len());
    let mut depth = 0usize;
    for c in attributes.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth > 0 => continue,
            _ => {}
        }
        compact.push(c);
    }

    compact
        .split_whitespace()
        .map(|token| {
            let inner = token
                .strip_prefix("annotate(")
                .and_then(|rest| rest.strip_suffix(')'))
                .unwrap_or(token);
            inner.trim_matches('"').to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    // Attribute strings as castxml writes them for the common SAL macros.
    const IN: &str = "annotate(SAL_pre) annotate(SAL_valid) annotate(SAL_readonly) annotate(SAL_pre)";
    const OUT: &str =
        "annotate(SAL_valid) annotate(SAL_post) annotate(SAL_writableTo(elementCount(1))) annotate(SAL_pre)";
    const INOUT: &str = "annotate(SAL_valid) annotate(SAL_post) annotate(SAL_valid) annotate(SAL_pre)";
    const OUT_WRITES: &str =
        "annotate(SAL_valid) annotate(SAL_post) annotate(SAL_writableTo(elementCount(NumViews))) annotate(SAL_pre)";
    const IN_READS: &str =
        "annotate(SAL_readableTo(elementCount(NumViews))) annotate(SAL_pre) annotate(SAL_valid) annotate(SAL_pre)";
    const IN_OPT: &str = "annotate(SAL_null(__maybe)) annotate(SAL_pre) annotate(SAL_valid) annotate(SAL_pre)";
    const OUT_OPT: &str = "annotate(SAL_maybenull) annotate(SAL_valid) annotate(SAL_post) annotate(SAL_writableTo(elementCount(1))) annotate(SAL_pre)";

    #[rstest]
    #[case(IN, ParamFlags::IN)]
    #[case(OUT, ParamFlags::OUT)]
    #[case(INOUT, ParamFlags::IN_OUT)]
    #[case(OUT_WRITES, ParamFlags::OUT | ParamFlags::BUFFER)]
    #[case(IN_READS, ParamFlags::IN | ParamFlags::BUFFER)]
    #[case(IN_OPT, ParamFlags::IN | ParamFlags::OPTIONAL)]
    #[case(OUT_OPT, ParamFlags::OUT | ParamFlags::OPTIONAL)]
    #[case("", ParamFlags::IN)]
    fn sal_strings_map_to_directions(#[case] attributes: &str, #[case] expected: ParamFlags) {
        assert_eq!(Annotations::parse(attributes).direction, expected);
    }

    #[test]
    fn whitespace_inside_parentheses_is_ignored() {
        let spaced = "annotate(SAL_writableTo( elementCount( 1 ) )) annotate(SAL_pre)";
        let parsed = Annotations::parse(spaced);
        assert_eq!(parsed.direction, ParamFlags::OUT);
    }

    #[test]
    fn quoted_annotate_tokens_are_unwrapped() {
        assert_eq!(
            tokenize(r#"annotate("SAL_pre") __stdcall__"#),
            vec!["SAL_pre".to_string(), "__stdcall__".to_string()]
        );
    }

    #[rstest]
    #[case("__stdcall__", CallingConvention::StdCall)]
    #[case("__cdecl__", CallingConvention::CDecl)]
    #[case("__thiscall__", CallingConvention::ThisCall)]
    fn calling_conventions(#[case] attributes: &str, #[case] expected: CallingConvention) {
        let mut signature = CppSignature::default();
        Annotations::parse(attributes).apply_to_signature(&mut signature);
        assert_eq!(signature.calling_convention, expected);
    }

    #[test]
    fn uuid_is_extracted_onto_interface() {
        let mut interface = CppInterface::default();
        Annotations::parse(r#"uuid("db6f6ddb-ac77-4e88-8253-819df9bbf140")"#)
            .apply_to_interface(&mut interface);
        assert_eq!(
            interface.guid.as_deref(),
            Some("db6f6ddb-ac77-4e88-8253-819df9bbf140")
        );
    }

    #[test]
    fn parameter_takes_final_direction() {
        let mut parameter = CppParameter::default();
        Annotations::parse(OUT_WRITES).apply_to_parameter(&mut parameter);
        assert!(parameter.attributes.contains(ParamFlags::OUT));
        assert!(parameter.attributes.contains(ParamFlags::BUFFER));
    }
}
