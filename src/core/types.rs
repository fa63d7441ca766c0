//! Value types shared by the parser, the filters and the cache.
//!
//! Directive arguments are resolved once, at parse time, into [`ParamValue`].
//! Filters only ever see typed values and never re-read annotation text.

use image::DynamicImage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single directive argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    /// Signed decimal, integer or fractional.
    Number(f64),
    /// Quoted (or bare-word) text with escapes already removed.
    Text(String),
    /// Presence flag. A key without `=` is `Boolean(true)`.
    Boolean(bool),
}

/// Directive arguments keyed by name, in first-seen order.
///
/// Inserting an existing key replaces its value, so the last occurrence wins.
pub type Parameters = IndexMap<String, ParamValue>;

impl ParamValue {
    /// Try to get this value as a number.
    pub fn as_number(&self) -> Option<f64> {
        if let ParamValue::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// Try to get this value as text.
    pub fn as_text(&self) -> Option<&str> {
        if let ParamValue::Text(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let ParamValue::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Text(s) => write!(f, "{}", s),
            ParamValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Colour scheme a render is targeting.
///
/// Only the `darkmode` composite looks at it, but it is part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Tag appended to cache file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("Unknown theme '{}': expected 'dark' or 'light'", other)),
        }
    }
}

/// RGBA color value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color from RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from RGB components (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a hex color string.
    ///
    /// Supports formats: "#RGB", "#RGBA", "#RRGGBB", "#RRGGBBAA". The leading
    /// `#` is optional.
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid hex color '{}'", hex));
        }

        let short = |i: usize| -> Result<u8, String> {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|e| e.to_string())
        };
        let long = |i: usize| -> Result<u8, String> {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string())
        };

        match hex.len() {
            3 => Ok(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Ok(Self::new(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Ok(Self::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Ok(Self::new(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => Err(format!(
                "Invalid hex color format: expected 3, 4, 6, or 8 characters, got {}",
                hex.len()
            )),
        }
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Common colors
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ============================================================================
// Pixel buffers
// ============================================================================

/// Bring a decoded image into the 8-bit layouts every filter understands.
///
/// Images with an alpha channel become RGBA8, everything else RGB8.
pub fn normalize_8bit(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Materialize an alpha channel. A no-op for RGBA8 input.
pub fn ensure_alpha(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgba8(_) => image,
        other => DynamicImage::ImageRgba8(other.to_rgba8()),
    }
}

/// Run `f` over the colour channels of every pixel.
///
/// `f` receives a slice of the whole pixel (3 or 4 bytes); alpha, if present,
/// is the fourth element and is left for `f` to ignore.
pub fn for_each_pixel(image: DynamicImage, mut f: impl FnMut(&mut [u8])) -> DynamicImage {
    match normalize_8bit(image) {
        DynamicImage::ImageRgba8(mut buf) => {
            buf.chunks_exact_mut(4).for_each(&mut f);
            DynamicImage::ImageRgba8(buf)
        }
        DynamicImage::ImageRgb8(mut buf) => {
            buf.chunks_exact_mut(3).for_each(&mut f);
            DynamicImage::ImageRgb8(buf)
        }
        other => other,
    }
}

/// Format a number the shortest way that still round-trips (`1.2`, `1`, `0.85`).
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
