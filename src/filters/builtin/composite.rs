//! Composite filters: DarkMode

use crate::core::error::FilterError;
use crate::core::filter::{Frame, ImageFilter};
use crate::core::types::{Color, Theme};
use crate::filters::builtin::alpha::{Removal, Threshold, Transparent};
use crate::filters::builtin::color::{BoostLightness, Invert};
use crate::filters::registry::FilterRegistry;

/// Register composite filters.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(DarkMode::NAME, |_| Box::new(DarkMode::new()));
    // Older annotations use the shorter trigger word.
    registry.register_alias("dark", DarkMode::NAME);
}

/// Adapts an image to the active theme.
///
/// - dark (default): invert, drop the near-black background, brighten.
/// - light: drop the near-white background, darken slightly.
#[derive(Debug, Clone)]
pub struct DarkMode {
    invert: Invert,
    dark_transparent: Transparent,
    dark_boost: BoostLightness,
    light_transparent: Transparent,
    light_boost: BoostLightness,
}

impl DarkMode {
    /// Registry name.
    pub const NAME: &'static str = "darkmode";
    /// Anything brighter than this on every channel is background on light themes.
    pub const LIGHT_BACKGROUND: Color = Color::rgb(240, 240, 240);
    /// Lightness multiplier for light themes.
    pub const LIGHT_AMOUNT: f64 = 0.85;

    /// Create the composite with its fixed sub-filters.
    pub fn new() -> Self {
        Self {
            invert: Invert,
            dark_transparent: Transparent::default(),
            dark_boost: BoostLightness::default(),
            light_transparent: Transparent::new(
                Threshold::Color(Self::LIGHT_BACKGROUND),
                Removal::Above,
            ),
            light_boost: BoostLightness::new(Self::LIGHT_AMOUNT),
        }
    }

    /// Sub-filters used for `theme`, in application order.
    pub fn steps(&self, theme: Theme) -> Vec<&dyn ImageFilter> {
        match theme {
            Theme::Dark => vec![
                &self.invert as &dyn ImageFilter,
                &self.dark_transparent,
                &self.dark_boost,
            ],
            Theme::Light => vec![&self.light_transparent as &dyn ImageFilter, &self.light_boost],
        }
    }
}

impl Default for DarkMode {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFilter for DarkMode {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn signature(&self) -> String {
        Self::NAME.to_string()
    }

    fn apply(&self, frame: Frame, theme: Option<Theme>) -> Result<Frame, FilterError> {
        let theme = theme.unwrap_or_default();
        self.steps(theme)
            .into_iter()
            .try_fold(frame, |frame, step| step.apply(frame, Some(theme)))
    }
}
