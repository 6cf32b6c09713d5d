//! RGBA colors and CSS color parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Swatches offered by the stroke and fill pickers.
pub const PALETTE: [Color; 8] = [
    Color::rgb(0x00, 0x00, 0x00),
    Color::rgb(0xFF, 0x6B, 0x6B),
    Color::rgb(0x4E, 0xCD, 0xC4),
    Color::rgb(0x45, 0xB7, 0xD1),
    Color::rgb(0xFF, 0xE6, 0x6D),
    Color::rgb(0xA8, 0xE6, 0xCF),
    Color::rgb(0xFF, 0x8B, 0x94),
    Color::rgb(0xFF, 0xA0, 0x7A),
];

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color: {0:?}")]
pub struct ColorParseError(pub String);

/// An 8-bit RGBA color. Serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same color with the alpha channel replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Alpha scaled by `opacity` (clamped to 0..=1).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(alpha)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Interpret this color as a fill: fully transparent means "no fill".
    pub fn into_fill(self) -> Option<Color> {
        (!self.is_transparent()).then_some(self)
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse a CSS color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
    /// `rgba(r, g, b, a)` or `transparent`.
    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let s = s.trim();
        let err = || ColorParseError(s.to_string());

        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Color::TRANSPARENT);
        }

        if let Some(hex) = s.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(err());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
            return match hex.len() {
                3 => {
                    let mut out = [0u8; 3];
                    for (slot, c) in out.iter_mut().zip(hex.chars()) {
                        let v = c.to_digit(16).ok_or_else(err)? as u8;
                        *slot = v * 17;
                    }
                    Ok(Color::rgb(out[0], out[1], out[2]))
                }
                6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
                8 => Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
                _ => Err(err()),
            };
        }

        let lower = s.to_ascii_lowercase();
        let (body, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(err());
        };
        let body = body.strip_suffix(')').ok_or_else(err)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != if has_alpha { 4 } else { 3 } {
            return Err(err());
        }
        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(&parts) {
            *slot = part.parse::<u8>().map_err(|_| err())?;
        }
        let a = if has_alpha {
            let alpha: f64 = parts[3].parse().map_err(|_| err())?;
            if !(0.0..=1.0).contains(&alpha) {
                return Err(err());
            }
            (alpha * 255.0).round() as u8
        } else {
            255
        };
        Ok(Color::new(rgb[0], rgb[1], rgb[2], a))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse("#FF6B6B").unwrap(), Color::rgb(255, 107, 107));
        assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
        assert_eq!(
            Color::parse("#00000080").unwrap(),
            Color::new(0, 0, 0, 128)
        );
    }

    #[test]
    fn test_parse_rgba() {
        assert_eq!(Color::parse("rgba(0,0,0,0)").unwrap(), Color::TRANSPARENT);
        assert_eq!(
            Color::parse("rgb(10, 20, 30)").unwrap(),
            Color::rgb(10, 20, 30)
        );
        assert_eq!(
            Color::parse("RGBA(255, 255, 255, 0.5)").unwrap(),
            Color::new(255, 255, 255, 128)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Color::parse("#12").is_err());
        assert!(Color::parse("red").is_err());
        assert!(Color::parse("rgba(1,2,3)").is_err());
        assert!(Color::parse("rgba(1,2,3,2)").is_err());
    }

    #[test]
    fn test_transparent_fill_is_none() {
        assert_eq!(Color::TRANSPARENT.into_fill(), None);
        assert_eq!(Color::WHITE.into_fill(), Some(Color::WHITE));
    }

    #[test]
    fn test_hex_roundtrip_text() {
        assert_eq!(Color::rgb(0x45, 0xB7, 0xD1).to_hex(), "#45b7d1");
        assert_eq!(Color::new(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(255, 107, 107)).unwrap();
        assert_eq!(json, "\"#ff6b6b\"");
        let back: Color = serde_json::from_str("\"rgba(0,0,0,0)\"").unwrap();
        assert_eq!(back, Color::TRANSPARENT);
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }
}
