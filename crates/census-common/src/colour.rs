//! Colour values used by palettes, gradient endpoints and legends.

use serde::{Deserialize, Serialize};

/// Color representation supporting multiple formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// Hex string: "#RRGGBB", "#RGB" or "#RRGGBBAA"
    Hex(String),

    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),

    /// Explicit RGBA
    Rgba { r: u8, g: u8, b: u8, a: u8 },
}

impl Color {
    pub fn hex(s: impl Into<String>) -> Self {
        Color::Hex(s.into())
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgba { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Color::Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Whether the colour can be decoded without falling back to black.
    pub fn is_valid(&self) -> bool {
        match self {
            Color::Hex(s) => parse_hex_color(s).is_some() || named_color(s).is_some(),
            Color::Array(arr) => arr.len() == 3 || arr.len() == 4,
            Color::Rgba { .. } => true,
        }
    }

    /// Convert to RGBA tuple. Undecodable colours become opaque black.
    pub fn to_rgba(&self) -> (u8, u8, u8, u8) {
        match self {
            Color::Hex(s) => parse_hex_color(s)
                .or_else(|| named_color(s))
                .unwrap_or((0, 0, 0, 255)),
            Color::Array(arr) => {
                let r = arr.first().copied().unwrap_or(0);
                let g = arr.get(1).copied().unwrap_or(0);
                let b = arr.get(2).copied().unwrap_or(0);
                let a = arr.get(3).copied().unwrap_or(255);
                (r, g, b, a)
            }
            Color::Rgba { r, g, b, a } => (*r, *g, *b, *a),
        }
    }

    /// Lower-case "#rrggbb" string, with an alpha pair only when not opaque.
    pub fn to_hex(&self) -> String {
        let (r, g, b, a) = self.to_rgba();
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }

    /// Linear interpolation between two colors, `t` clamped to [0, 1].
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let (r1, g1, b1, a1) = self.to_rgba();
        let (r2, g2, b2, a2) = other.to_rgba();

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let lerp_u8 = |a: u8, b: u8, t: f64| -> u8 {
            ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8
        };

        Color::Rgba {
            r: lerp_u8(r1, r2, t),
            g: lerp_u8(g1, g2, t),
            b: lerp_u8(b1, b2, t),
            a: lerp_u8(a1, a2, t),
        }
    }
}

fn parse_hex_color(s: &str) -> Option<(u8, u8, u8, u8)> {
    let s = s.strip_prefix('#')?;
    if !s.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();

    match s.len() {
        3 => {
            let nibble = |i: usize| u8::from_str_radix(&s[i..i + 1], 16).ok().map(|v| v * 17);
            Some((nibble(0)?, nibble(1)?, nibble(2)?, 255))
        }
        6 => Some((channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some((channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<(u8, u8, u8, u8)> {
    let rgba = match name.to_lowercase().as_str() {
        "transparent" => (0, 0, 0, 0),
        "black" => (0, 0, 0, 255),
        "white" => (255, 255, 255, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        "darkgray" | "darkgrey" => (169, 169, 169, 255),
        _ => return None,
    };
    Some(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::hex("#FF5500").to_rgba(), (255, 85, 0, 255));
        assert_eq!(Color::hex("#f60").to_rgba(), (255, 102, 0, 255));
        assert_eq!(Color::Array(vec![100, 150, 200]).to_rgba(), (100, 150, 200, 255));
        assert_eq!(Color::hex("grey").to_rgba(), (128, 128, 128, 255));
    }

    #[test]
    fn test_invalid_hex_is_reported() {
        assert!(!Color::hex("#GGGGGG").is_valid());
        assert!(!Color::hex("f6d2a9").is_valid());
        assert!(Color::hex("#f6d2a9").is_valid());
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let low = Color::hex("#000000");
        let high = Color::hex("#ffffff");
        assert_eq!(low.lerp(&high, 0.0).to_hex(), "#000000");
        assert_eq!(low.lerp(&high, 1.0).to_hex(), "#ffffff");
        assert_eq!(low.lerp(&high, 0.5).to_hex(), "#808080");
        assert_eq!(low.lerp(&high, 7.0).to_hex(), "#ffffff");
    }
}
