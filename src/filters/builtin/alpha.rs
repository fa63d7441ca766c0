//! Alpha filters: Transparent

use crate::core::error::FilterError;
use crate::core::filter::{format_signature, Frame, ImageFilter};
use crate::core::types::{ensure_alpha, format_number, Color, ParamValue, Parameters, Theme};
use crate::filters::registry::FilterRegistry;
use image::DynamicImage;
use std::fmt;

/// Register alpha filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(Transparent::NAME, |params| {
        Box::new(Transparent::from_parameters(params))
    });
}

/// Per-channel cutoff for [`Transparent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// The same value for R, G and B.
    Uniform(f64),
    /// One value per channel, taken from a color.
    Color(Color),
}

impl Threshold {
    fn channels(&self) -> [f64; 3] {
        match self {
            Threshold::Uniform(v) => [*v; 3],
            Threshold::Color(c) => [c.r as f64, c.g as f64, c.b as f64],
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Uniform(v) => f.write_str(&format_number(*v)),
            Threshold::Color(c) => write!(f, "{}", Color::rgb(c.r, c.g, c.b).to_hex()),
        }
    }
}

/// Which side of the threshold gets cut out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Removal {
    /// Remove pixels darker than the threshold on every channel.
    #[default]
    Below,
    /// Remove pixels brighter than the threshold on every channel.
    Above,
}

impl Removal {
    fn as_str(&self) -> &'static str {
        match self {
            Removal::Below => "below",
            Removal::Above => "above",
        }
    }
}

/// Makes near-black (or near-white) pixels fully transparent.
///
/// Matching pixels become `(0, 0, 0, 0)`; every other pixel, alpha included,
/// is left untouched. Comparisons are strict on all three channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transparent {
    threshold: Threshold,
    remove: Removal,
}

impl Transparent {
    /// Registry name.
    pub const NAME: &'static str = "transparent";
    /// Default cutoff, roughly 5% of full scale.
    pub const DEFAULT_THRESHOLD: f64 = 13.0;

    /// Create a transparency filter.
    pub fn new(threshold: Threshold, remove: Removal) -> Self {
        Self { threshold, remove }
    }

    /// Build from directive arguments, falling back to defaults.
    ///
    /// `threshold` accepts a number or a hex color; `remove` accepts
    /// `"above"` or `"below"`.
    pub fn from_parameters(params: &Parameters) -> Self {
        let threshold = match params.get("threshold") {
            Some(ParamValue::Number(n)) => Threshold::Uniform(*n),
            Some(ParamValue::Text(text)) => match Color::from_hex(text) {
                Ok(color) => Threshold::Color(color),
                Err(e) => {
                    log::debug!("[transparent] ignoring threshold '{}': {}", text, e);
                    Threshold::Uniform(Self::DEFAULT_THRESHOLD)
                }
            },
            _ => Threshold::Uniform(Self::DEFAULT_THRESHOLD),
        };

        let remove = match params.get("remove").and_then(ParamValue::as_text) {
            Some(text) if text.eq_ignore_ascii_case("above") => Removal::Above,
            _ => Removal::Below,
        };

        Self::new(threshold, remove)
    }

    /// Configured threshold.
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Configured side.
    pub fn remove(&self) -> Removal {
        self.remove
    }

    fn matches(&self, px: &[u8], limits: &[f64; 3]) -> bool {
        let r = px[0] as f64;
        let g = px[1] as f64;
        let b = px[2] as f64;
        match self.remove {
            Removal::Below => r < limits[0] && g < limits[1] && b < limits[2],
            Removal::Above => r > limits[0] && g > limits[1] && b > limits[2],
        }
    }
}

impl Default for Transparent {
    fn default() -> Self {
        Self::new(Threshold::Uniform(Self::DEFAULT_THRESHOLD), Removal::Below)
    }
}

impl ImageFilter for Transparent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn signature(&self) -> String {
        format_signature(
            Self::NAME,
            &[
                ("threshold", self.threshold.to_string()),
                ("remove", self.remove.as_str().to_string()),
            ],
        )
    }

    fn apply(&self, frame: Frame, _theme: Option<Theme>) -> Result<Frame, FilterError> {
        let Frame { image, source } = frame;
        let limits = self.threshold.channels();

        let mut rgba = match ensure_alpha(image) {
            DynamicImage::ImageRgba8(buf) => buf,
            other => other.to_rgba8(),
        };
        for px in rgba.chunks_exact_mut(4) {
            if self.matches(px, &limits) {
                px.copy_from_slice(&[0, 0, 0, 0]);
            }
        }

        Ok(Frame::new(DynamicImage::ImageRgba8(rgba), source))
    }
}
