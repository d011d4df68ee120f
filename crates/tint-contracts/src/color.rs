use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Opaque 8-bit sRGB color, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Accepts `#RRGGBB` or `RRGGBB`, any case.
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |idx: usize| u8::from_str_radix(&digits[idx..idx + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn from_unit(rgb: [f32; 3]) -> Self {
        let quantize = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(quantize(rgb[0]), quantize(rgb[1]), quantize(rgb[2]))
    }

    pub fn to_unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(raw).ok_or_else(|| format!("'{raw}' is not a #RRGGBB color"))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn parse_hex_accepts_case_and_missing_hash() {
        assert_eq!(Rgb::parse_hex("#ff0000"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::parse_hex("00Ff80"), Some(Rgb::new(0, 255, 128)));
        assert_eq!(Rgb::parse_hex(" #808080 "), Some(Rgb::new(128, 128, 128)));
    }

    #[test]
    fn parse_hex_rejects_short_and_named_colors() {
        assert_eq!(Rgb::parse_hex("#fff"), None);
        assert_eq!(Rgb::parse_hex("red"), None);
        assert_eq!(Rgb::parse_hex("#GG0000"), None);
        assert_eq!(Rgb::parse_hex(""), None);
    }

    #[test]
    fn hex_output_is_upper_case() {
        assert_eq!(Rgb::new(0xab, 0x0c, 0xde).to_hex(), "#AB0CDE");
    }

    #[test]
    fn unit_conversion_quantizes_and_clamps() {
        assert_eq!(Rgb::from_unit([1.0, 0.5, -2.0]), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::from_unit(Rgb::new(12, 200, 99).to_unit()), Rgb::new(12, 200, 99));
    }
}
