//! Built-in filter implementations.
//!
//! This module contains the filters that can be requested from alt-text.

mod alpha;
mod color;
mod composite;
mod sharpen;

use crate::core::types::{ParamValue, Parameters};
use crate::filters::registry::FilterRegistry;

/// Register all built-in filters.
pub fn register_all(registry: &mut FilterRegistry) {
    color::register(registry);
    alpha::register(registry);
    sharpen::register(registry);
    composite::register(registry);
}

// Re-export for direct access
pub use alpha::{Removal, Threshold, Transparent};
pub use color::{hsl_to_rgb, rgb_to_hsl, BoostLightness, Contrast, Invert};
pub use composite::DarkMode;
pub use sharpen::Sharpness;

/// Numeric parameter lookup. Wrong-typed values count as missing.
pub(crate) fn number_param(params: &Parameters, key: &str) -> Option<f64> {
    params.get(key).and_then(ParamValue::as_number)
}
