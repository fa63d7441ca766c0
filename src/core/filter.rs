//! ImageFilter trait and the frame that flows through a chain.
//!
//! Every filter is an immutable value built from its parameters by the
//! registry. It exposes a canonical signature, which feeds the cache key, and
//! a pure `apply` that maps one frame to the next.

use crate::core::descriptor::SourceDescriptor;
use crate::core::error::FilterError;
use crate::core::types::Theme;
use image::DynamicImage;
use std::fmt;

/// A pixel buffer together with the source it was decoded from.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Current pixel data, 8 bits per channel.
    pub image: DynamicImage,
    /// The original source. Filters pass it through unchanged.
    pub source: SourceDescriptor,
}

impl Frame {
    /// Create a new frame.
    pub fn new(image: DynamicImage, source: SourceDescriptor) -> Self {
        Self { image, source }
    }

    /// Replace the pixel data, keeping the source.
    pub fn with_image(self, image: DynamicImage) -> Self {
        Self {
            image,
            source: self.source,
        }
    }
}

/// The interface every filter implements.
///
/// # Signatures
///
/// `signature()` must fully encode the filter name and every resolved
/// parameter, e.g. `boost-lightness(amount=1.2)`. Two filters with equal
/// signatures must produce identical output for identical input, since the
/// cache relies on it.
///
/// # Themes
///
/// The theme is only known at render time. Filters that do not care about it
/// ignore the argument.
pub trait ImageFilter: Send + Sync + fmt::Debug {
    /// Registry name of this filter (e.g. `"invert"`).
    fn name(&self) -> &'static str;

    /// Canonical signature used in cache keys.
    fn signature(&self) -> String;

    /// Transform one frame into the next.
    fn apply(&self, frame: Frame, theme: Option<Theme>) -> Result<Frame, FilterError>;
}

/// Format a signature as `name(key=value,...)`, or just `name` when there
/// are no parameters.
pub fn format_signature(name: &str, parameters: &[(&str, String)]) -> String {
    if parameters.is_empty() {
        return name.to_string();
    }
    let args: Vec<String> = parameters
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    format!("{}({})", name, args.join(","))
}
