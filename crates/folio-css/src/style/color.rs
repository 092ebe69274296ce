//! Color values and parsing
//!
//! [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)

use serde::{Deserialize, Serialize};

/// [§ 4 Color syntax](https://www.w3.org/TR/css-color-4/#color-syntax)
/// sRGB color represented as RGBA components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    /// "the red color channel" (0-255)
    pub r: u8,
    /// "the green color channel" (0-255)
    pub g: u8,
    /// "the blue color channel" (0-255)
    pub b: u8,
    /// "the alpha channel" (0-255, 255 = fully opaque)
    pub a: u8,
}

impl RgbColor {
    /// Black (#000000)
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    /// White (#ffffff)
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// An opaque color.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// [§ 4.2 The RGB hexadecimal notations](https://www.w3.org/TR/css-color-4/#hex-notation)
    /// "The syntax of a <hex-color> is a <hash-token> token whose value consists of
    /// 3, 4, 6, or 8 hexadecimal digits."
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let digit = |i: usize, len: usize| -> Option<u8> {
            let part = &hex[i * len..(i + 1) * len];
            // "The three-digit RGB notation (#RGB) is converted into six-digit form (#RRGGBB)
            // by replicating digits, not by adding zeros."
            let part = if len == 1 { part.repeat(2) } else { part.to_string() };
            u8::from_str_radix(&part, 16).ok()
        };
        match hex.len() {
            3 => Some(Self::opaque(digit(0, 1)?, digit(1, 1)?, digit(2, 1)?)),
            4 => Some(Self {
                r: digit(0, 1)?,
                g: digit(1, 1)?,
                b: digit(2, 1)?,
                a: digit(3, 1)?,
            }),
            6 => Some(Self::opaque(digit(0, 2)?, digit(1, 2)?, digit(2, 2)?)),
            8 => Some(Self {
                r: digit(0, 2)?,
                g: digit(1, 2)?,
                b: digit(2, 2)?,
                a: digit(3, 2)?,
            }),
            _ => None,
        }
    }

    /// [§ 6.1 Named Colors](https://www.w3.org/TR/css-color-4/#named-colors)
    ///
    /// The basic sixteen plus a few common aliases and `transparent`.
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let rgb = match name.to_ascii_lowercase().as_str() {
            "transparent" => return Some(Self::TRANSPARENT),
            "black" => (0, 0, 0),
            "silver" => (192, 192, 192),
            "gray" | "grey" => (128, 128, 128),
            "white" => (255, 255, 255),
            "maroon" => (128, 0, 0),
            "red" => (255, 0, 0),
            "purple" => (128, 0, 128),
            "fuchsia" | "magenta" => (255, 0, 255),
            "green" => (0, 128, 0),
            "lime" => (0, 255, 0),
            "olive" => (128, 128, 0),
            "yellow" => (255, 255, 0),
            "navy" => (0, 0, 128),
            "blue" => (0, 0, 255),
            "teal" => (0, 128, 128),
            "aqua" | "cyan" => (0, 255, 255),
            "orange" => (255, 165, 0),
            "lightgray" | "lightgrey" => (211, 211, 211),
            "darkgray" | "darkgrey" => (169, 169, 169),
            _ => return None,
        };
        Some(Self::opaque(rgb.0, rgb.1, rgb.2))
    }

    /// Convert to hex string notation (#rrggbb or #rrggbbaa if alpha != 255)
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Alpha as a fraction.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

/// Device CMYK color, each channel in `0.0..=1.0`.
///
/// [§ 14 Device-dependent CMYK colors](https://www.w3.org/TR/css-color-5/#device-cmyk)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CmykColor {
    /// Cyan.
    pub c: f32,
    /// Magenta.
    pub m: f32,
    /// Yellow.
    pub y: f32,
    /// Black.
    pub k: f32,
}

impl CmykColor {
    /// "naive conversion": `r = 1 - min(1, c + k)` per channel.
    #[must_use]
    pub fn to_rgb(&self) -> RgbColor {
        let channel = |v: f32| ((1.0 - (v + self.k).min(1.0)) * 255.0).round() as u8;
        RgbColor::opaque(channel(self.c), channel(self.m), channel(self.y))
    }
}

/// A resolved color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "lowercase")]
pub enum ColorValue {
    /// sRGB with alpha.
    Rgb(RgbColor),
    /// Device CMYK, kept as CMYK so print backends can emit it untouched.
    Cmyk(CmykColor),
}

impl ColorValue {
    /// Parse color text: hex, `rgb()`/`rgba()`, `cmyk()`/`device-cmyk()`,
    /// or a named color.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with('#') {
            return RgbColor::from_hex(text).map(Self::Rgb);
        }
        if let Some((name, args)) = text.split_once('(') {
            let args = args.strip_suffix(')')?;
            let parts: Vec<&str> = args
                .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .collect();
            return match name.trim().to_ascii_lowercase().as_str() {
                "rgb" | "rgba" => parse_rgb_function(&parts).map(Self::Rgb),
                "cmyk" | "device-cmyk" => parse_cmyk_function(&parts).map(Self::Cmyk),
                _ => None,
            };
        }
        RgbColor::from_named(text).map(Self::Rgb)
    }

    /// The sRGB equivalent.
    #[must_use]
    pub fn to_rgb(&self) -> RgbColor {
        match self {
            Self::Rgb(rgb) => *rgb,
            Self::Cmyk(cmyk) => cmyk.to_rgb(),
        }
    }

    /// Whether painting this color has no visible effect.
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        matches!(self, Self::Rgb(RgbColor { a: 0, .. }))
    }
}

/// [§ 5.1 The RGB functions](https://www.w3.org/TR/css-color-4/#rgb-functions)
fn parse_rgb_function(parts: &[&str]) -> Option<RgbColor> {
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        if let Some(pct) = s.strip_suffix('%') {
            let v: f32 = pct.parse().ok()?;
            Some((v.clamp(0.0, 100.0) * 2.55).round() as u8)
        } else {
            let v: f32 = s.parse().ok()?;
            Some(v.clamp(0.0, 255.0).round() as u8)
        }
    };
    let alpha = match parts.get(3) {
        Some(s) => {
            let v: f32 = match s.strip_suffix('%') {
                Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                None => s.parse().ok()?,
            };
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(RgbColor {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: alpha,
    })
}

fn parse_cmyk_function(parts: &[&str]) -> Option<CmykColor> {
    if parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<f32> {
        let v = match s.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? / 100.0,
            None => s.parse().ok()?,
        };
        Some(v.clamp(0.0, 1.0))
    };
    Some(CmykColor {
        c: channel(parts[0])?,
        m: channel(parts[1])?,
        y: channel(parts[2])?,
        k: channel(parts[3])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(RgbColor::from_hex("#f00"), Some(RgbColor::opaque(255, 0, 0)));
        assert_eq!(RgbColor::from_hex("#ff000080").map(|c| c.a), Some(128));
        assert_eq!(RgbColor::from_hex("#ff00"), Some(RgbColor { r: 255, g: 255, b: 0, a: 0 }));
        assert_eq!(RgbColor::from_hex("#12345"), None);
        assert_eq!(RgbColor::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_functions() {
        assert_eq!(
            ColorValue::parse("rgb(255, 128, 0)"),
            Some(ColorValue::Rgb(RgbColor::opaque(255, 128, 0)))
        );
        assert_eq!(
            ColorValue::parse("rgba(0,0,0,0.5)").map(|c| c.to_rgb().a),
            Some(128)
        );
        let cmyk = ColorValue::parse("cmyk(0, 1, 1, 0)").unwrap();
        assert_eq!(cmyk.to_rgb(), RgbColor::opaque(255, 0, 0));
        assert_eq!(ColorValue::parse("hsl(0, 100%, 50%)"), None);
    }

    #[test]
    fn test_named_and_transparent() {
        assert_eq!(ColorValue::parse("Navy").map(|c| c.to_rgb()), Some(RgbColor::opaque(0, 0, 128)));
        assert!(ColorValue::parse("transparent").unwrap().is_transparent());
    }
}
