//! GUID values as laid out in memory by COM headers.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `{int32, int16, int16, uint8[8]}`, the layout of `struct _GUID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Guid {
    pub data1: i32,
    pub data2: i16,
    pub data3: i16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Parse a castxml aggregate initializer such as
    /// `{-1135593225ul, 9184u, 18784u, {150u, 218u, 51u, 171u, 175u, 89u, 53u, 236u}}`.
    ///
    /// Returns `None` unless the text starts with `{`, ends with `}}` and
    /// holds exactly eleven integer components. Integer suffixes (`u`, `l`)
    /// are ignored; each component wraps into its field width.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn parse_initializer(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('{') || !text.ends_with("}}") {
            return None;
        }

        let stripped: String = text.chars().filter(|c| *c != '{' && *c != '}').collect();
        let values = stripped
            .split(',')
            .map(parse_component)
            .collect::<Option<Vec<i64>>>()?;
        if values.len() != 11 {
            return None;
        }

        let mut data4 = [0u8; 8];
        for (slot, value) in data4.iter_mut().zip(&values[3..]) {
            *slot = *value as u8;
        }

        Some(Self {
            data1: values[0] as i32,
            data2: values[1] as i16,
            data3: values[2] as i16,
            data4,
        })
    }
}

fn parse_component(raw: &str) -> Option<i64> {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    trimmed.parse::<i64>().ok()
}

impl fmt::Display for Guid {
    #[allow(clippy::cast_sign_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1 as u32,
            self.data2 as u16,
            self.data3 as u16,
            d[0],
            d[1],
            d[2],
            d[3],
            d[4],
            d[5],
            d[6],
            d[7]
        )
    }
}
