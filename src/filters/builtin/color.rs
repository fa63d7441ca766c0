//! Color adjustment filters: Invert, Contrast, BoostLightness

use crate::core::error::FilterError;
use crate::core::filter::{format_signature, Frame, ImageFilter};
use crate::core::types::{for_each_pixel, format_number, Parameters, Theme};
use crate::filters::builtin::number_param;
use crate::filters::registry::FilterRegistry;

/// Register color filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(Invert::NAME, |_| Box::new(Invert));
    registry.register(Contrast::NAME, |params| Box::new(Contrast::from_parameters(params)));
    registry.register(BoostLightness::NAME, |params| {
        Box::new(BoostLightness::from_parameters(params))
    });
}

/// Inverts the color channels of an image. Alpha is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invert;

impl Invert {
    /// Registry name.
    pub const NAME: &'static str = "invert";
}

impl ImageFilter for Invert {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn signature(&self) -> String {
        Self::NAME.to_string()
    }

    fn apply(&self, frame: Frame, _theme: Option<Theme>) -> Result<Frame, FilterError> {
        let Frame { image, source } = frame;
        let inverted = for_each_pixel(image, |px| {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        });
        Ok(Frame::new(inverted, source))
    }
}

/// Quadratic contrast curve: `x' = x + (1 - x) * amount * x`.
///
/// The result is not clamped. It is truncated toward zero and wrapped into
/// the 8-bit range, so large amounts fold bright values back into the dark
/// end (`amount = 3` maps 128 to 63).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contrast {
    amount: f64,
}

impl Contrast {
    /// Registry name.
    pub const NAME: &'static str = "contrast";
    /// Default curve strength.
    pub const DEFAULT_AMOUNT: f64 = 1.0;

    /// Create a contrast filter.
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    /// Build from directive arguments, falling back to defaults.
    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new(number_param(params, "amount").unwrap_or(Self::DEFAULT_AMOUNT))
    }

    /// Curve strength.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    fn adjust(&self, value: u8) -> u8 {
        let x = value as f64 / 255.0;
        let scaled = (x + (1.0 - x) * self.amount * x) * 255.0;
        // Truncate, then wrap modulo 256.
        scaled.trunc() as i64 as u8
    }
}

impl Default for Contrast {
    fn default() -> Self {
        Self::new(Self::DEFAULT_AMOUNT)
    }
}

impl ImageFilter for Contrast {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn signature(&self) -> String {
        format_signature(Self::NAME, &[("amount", format_number(self.amount))])
    }

    fn apply(&self, frame: Frame, _theme: Option<Theme>) -> Result<Frame, FilterError> {
        let Frame { image, source } = frame;
        let adjusted = for_each_pixel(image, |px| {
            px[0] = self.adjust(px[0]);
            px[1] = self.adjust(px[1]);
            px[2] = self.adjust(px[2]);
        });
        Ok(Frame::new(adjusted, source))
    }
}

/// Scales HSL lightness by `amount`, capped at 100%.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostLightness {
    amount: f64,
}

impl BoostLightness {
    /// Registry name.
    pub const NAME: &'static str = "boost-lightness";
    /// Default lightness multiplier.
    pub const DEFAULT_AMOUNT: f64 = 1.2;

    /// Create a lightness filter.
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    /// Build from directive arguments, falling back to defaults.
    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new(number_param(params, "amount").unwrap_or(Self::DEFAULT_AMOUNT))
    }

    /// Lightness multiplier.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    fn boost(&self, px: &mut [u8]) {
        let (h, s, l) = rgb_to_hsl(px[0], px[1], px[2]);
        let [r, g, b] = hsl_to_rgb(h, s, (l * self.amount).min(100.0));
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
}

impl Default for BoostLightness {
    fn default() -> Self {
        Self::new(Self::DEFAULT_AMOUNT)
    }
}

impl ImageFilter for BoostLightness {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn signature(&self) -> String {
        format_signature(Self::NAME, &[("amount", format_number(self.amount))])
    }

    fn apply(&self, frame: Frame, _theme: Option<Theme>) -> Result<Frame, FilterError> {
        let Frame { image, source } = frame;
        let boosted = for_each_pixel(image, |px| self.boost(px));
        Ok(Frame::new(boosted, source))
    }
}

// ============================================================================
// HSL conversion
// ============================================================================

/// RGB (0-255) to HSL: hue in degrees `[0, 360)`, saturation and lightness
/// in percent.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0 * 100.0;

    let mut h = 0.0;
    let mut s = 0.0;

    if max != min {
        let d = max - min;
        s = if l > 50.0 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        s *= 100.0;

        // Ties resolve in r, g, b order.
        h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        h = (h * 60.0) % 360.0;
    }

    (if h < 0.0 { h + 360.0 } else { h }, s, l)
}

/// HSL (degrees, percent, percent) back to rounded RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    let h = h / 360.0;
    let s = s / 100.0;
    let l = l / 100.0;

    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };

    [to_channel(r), to_channel(g), to_channel(b)]
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
