//! Resolved type descriptors and the flags decoded from declaration annotations.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CppType
// ---------------------------------------------------------------------------

/// The result of walking a typedef/pointer/array/cv chain down to its terminal type.
///
/// `pointer` holds one `*` per pointer layer and one `&` per reference layer,
/// outermost first. Markers only ever accumulate while the chain is walked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CppType {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pointer: String,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array_dimensions: Vec<u32>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CppType {
    #[must_use]
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Number of pointer and reference layers.
    #[must_use]
    pub fn pointer_depth(&self) -> usize {
        self.pointer.len()
    }

    #[must_use]
    pub fn is_pointer(&self) -> bool {
        !self.pointer.is_empty()
    }

    /// Array dimensions joined as `"4,2"`, or `None` for non-arrays.
    #[must_use]
    pub fn dimension_string(&self) -> Option<String> {
        if self.array_dimensions.is_empty() {
            return None;
        }
        let dims: Vec<String> = self
            .array_dimensions
            .iter()
            .map(ToString::to_string)
            .collect();
        Some(dims.join(","))
    }
}

impl fmt::Display for CppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        write!(f, "{}{}", self.type_name, self.pointer)?;
        for dim in &self.array_dimensions {
            write!(f, "[{dim}]")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CallingConvention
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallingConvention {
    #[default]
    Unknown,
    StdCall,
    CDecl,
    ThisCall,
}

impl CallingConvention {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::StdCall => "stdcall",
            Self::CDecl => "cdecl",
            Self::ThisCall => "thiscall",
        }
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ParamFlags
// ---------------------------------------------------------------------------

/// Direction and shape of a parameter, as a small bit set.
///
/// `IN`, `OUT` and `IN_OUT` are mutually exclusive once a parameter has been
/// finalized; `BUFFER` and `OPTIONAL` combine freely with them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ParamFlags(u8);

impl ParamFlags {
    pub const NONE: Self = Self(0);
    pub const IN: Self = Self(1);
    pub const OUT: Self = Self(1 << 1);
    pub const IN_OUT: Self = Self(1 << 2);
    pub const BUFFER: Self = Self(1 << 3);
    pub const OPTIONAL: Self = Self(1 << 4);

    const DIRECTION: u8 = Self::IN.0 | Self::OUT.0 | Self::IN_OUT.0;

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when any of `IN`, `OUT` or `IN_OUT` is set.
    #[must_use]
    pub const fn has_direction(self) -> bool {
        self.0 & Self::DIRECTION != 0
    }

    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Collapse `IN | OUT` into `IN_OUT`, keeping the other bits.
    #[must_use]
    pub const fn normalized(self) -> Self {
        if self.contains(Self::IN) && self.contains(Self::OUT) {
            Self((self.0 & !(Self::IN.0 | Self::OUT.0)) | Self::IN_OUT.0)
        } else {
            self
        }
    }
}

impl BitOr for ParamFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ParamFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ParamFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::IN, "in"),
            (Self::OUT, "out"),
            (Self::IN_OUT, "inout"),
            (Self::BUFFER, "buffer"),
            (Self::OPTIONAL, "optional"),
        ];
        let parts: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if parts.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&parts.join("|"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_string_joins_in_walk_order() {
        let ty = CppType {
            type_name: "int".into(),
            is_array: true,
            array_dimensions: vec![4, 2],
            ..CppType::default()
        };
        assert_eq!(ty.dimension_string().as_deref(), Some("4,2"));
        assert_eq!(ty.to_string(), "int[4][2]");
    }

    #[test]
    fn non_array_has_no_dimension_string() {
        assert_eq!(CppType::named("float").dimension_string(), None);
    }

    #[test]
    fn in_and_out_collapse_to_in_out() {
        let flags = (ParamFlags::IN | ParamFlags::OUT | ParamFlags::BUFFER).normalized();
        assert!(flags.contains(ParamFlags::IN_OUT));
        assert!(flags.contains(ParamFlags::BUFFER));
        assert!(!flags.contains(ParamFlags::IN));
        assert!(!flags.contains(ParamFlags::OUT));
    }

    #[test]
    fn single_direction_is_left_alone() {
        let flags = (ParamFlags::OUT | ParamFlags::OPTIONAL).normalized();
        assert_eq!(flags, ParamFlags::OUT | ParamFlags::OPTIONAL);
        assert_eq!(flags.to_string(), "out|optional");
    }
}
