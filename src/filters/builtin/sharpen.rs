//! Sharpening filters: Sharpness

use crate::core::error::FilterError;
use crate::core::filter::{format_signature, Frame, ImageFilter};
use crate::core::types::{format_number, normalize_8bit, Parameters, Theme};
use crate::filters::builtin::number_param;
use crate::filters::registry::FilterRegistry;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::filter::filter3x3;

/// Register sharpening filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(Sharpness::NAME, |params| {
        Box::new(Sharpness::from_parameters(params))
    });
}

/// 3x3 sharpening convolution.
///
/// The kernel has `1 + 8 * amount` at the centre and `-amount` on the eight
/// neighbours. It is applied without normalization; the weights already sum
/// to one, so flat regions keep their brightness. Sums are rounded to the
/// nearest integer and saturate at 0 and 255. The one-pixel border has no
/// full neighbourhood and is copied unchanged. Alpha is preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpness {
    amount: f64,
}

impl Sharpness {
    /// Registry name.
    pub const NAME: &'static str = "sharpness";
    /// Default edge emphasis.
    pub const DEFAULT_AMOUNT: f64 = 1.0;

    /// Create a sharpening filter.
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    /// Build from directive arguments, falling back to defaults.
    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new(number_param(params, "amount").unwrap_or(Self::DEFAULT_AMOUNT))
    }

    /// Edge emphasis.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Row-major 3x3 kernel.
    pub fn kernel(&self) -> [f32; 9] {
        let x = -(self.amount as f32);
        let c = 1.0 + 8.0 * self.amount as f32;
        [x, x, x, x, c, x, x, x, x]
    }

    fn convolve(&self, rgb: &RgbImage) -> RgbImage {
        let sums = filter3x3::<_, f32, f32>(rgb, &self.kernel());
        let (width, height) = rgb.dimensions();
        RgbImage::from_fn(width, height, |x, y| {
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                *rgb.get_pixel(x, y)
            } else {
                Rgb(sums.get_pixel(x, y).0.map(to_channel))
            }
        })
    }
}

/// Round to the nearest level, then saturate.
fn to_channel(sum: f32) -> u8 {
    sum.round().clamp(0.0, 255.0) as u8
}

impl Default for Sharpness {
    fn default() -> Self {
        Self::new(Self::DEFAULT_AMOUNT)
    }
}

impl ImageFilter for Sharpness {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn signature(&self) -> String {
        format_signature(Self::NAME, &[("amount", format_number(self.amount))])
    }

    fn apply(&self, frame: Frame, _theme: Option<Theme>) -> Result<Frame, FilterError> {
        if !self.amount.is_finite() {
            return Err(FilterError::Unsupported {
                filter: self.signature(),
                reason: "amount must be a finite number".to_string(),
            });
        }

        let Frame { image, source } = frame;
        let sharpened = match normalize_8bit(image) {
            DynamicImage::ImageRgba8(mut rgba) => {
                let rgb = DynamicImage::ImageRgba8(rgba.clone()).to_rgb8();
                let convolved = self.convolve(&rgb);
                for (dst, src) in rgba.pixels_mut().zip(convolved.pixels()) {
                    dst.0[..3].copy_from_slice(&src.0);
                }
                DynamicImage::ImageRgba8(rgba)
            }
            other => DynamicImage::ImageRgb8(self.convolve(&other.to_rgb8())),
        };

        Ok(Frame::new(sharpened, source))
    }
}
