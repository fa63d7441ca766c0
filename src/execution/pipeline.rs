//! Ordered filter chains.

use crate::core::error::FilterError;
use crate::core::filter::{Frame, ImageFilter};
use crate::core::types::Theme;
use std::fmt;

/// Filters in the order their directives appeared.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn ImageFilter>>,
}

impl FilterChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Append a filter.
    pub fn push(&mut self, filter: Box<dyn ImageFilter>) {
        self.filters.push(filter);
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True when no filters were requested.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Ordered signatures, as used in cache keys.
    pub fn signatures(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.signature()).collect()
    }

    /// Run every filter in turn. The first failure aborts the chain.
    pub fn apply(&self, frame: Frame, theme: Option<Theme>) -> Result<Frame, FilterError> {
        self.filters.iter().try_fold(frame, |frame, filter| {
            log::trace!("[pipeline] {} on {}", filter.signature(), frame.source);
            filter.apply(frame, theme)
        })
    }
}

impl FromIterator<Box<dyn ImageFilter>> for FilterChain {
    fn from_iter<I: IntoIterator<Item = Box<dyn ImageFilter>>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.signatures()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::SourceDescriptor;
    use crate::filters::builtin::{BoostLightness, Invert, Transparent};
    use image::{DynamicImage, Rgba, RgbaImage};

    #[derive(Debug)]
    struct Failing;

    impl ImageFilter for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn signature(&self) -> String {
            "failing".to_string()
        }

        fn apply(&self, _frame: Frame, _theme: Option<Theme>) -> Result<Frame, FilterError> {
            Err(FilterError::Failed {
                filter: "failing".into(),
                reason: "always".into(),
            })
        }
    }

    fn frame() -> Frame {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        Frame::new(
            DynamicImage::ImageRgba8(img),
            SourceDescriptor::new("p.png", "p.png", "p", 7),
        )
    }

    #[test]
    fn test_order_is_preserved() {
        let chain: FilterChain = vec![
            Box::new(Invert) as Box<dyn ImageFilter>,
            Box::new(BoostLightness::default()),
            Box::new(Transparent::default()),
        ]
        .into_iter()
        .collect();

        assert_eq!(chain.len(), 3);
        assert_eq!(
            chain.signatures(),
            vec![
                "invert",
                "boost-lightness(amount=1.2)",
                "transparent(threshold=13,remove=below)"
            ]
        );
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let out = FilterChain::new().apply(frame(), None).unwrap();
        assert_eq!(out.image.to_rgba8(), frame().image.to_rgba8());
    }

    #[test]
    fn test_source_is_carried_through() {
        let mut chain = FilterChain::new();
        chain.push(Box::new(Invert));
        let out = chain.apply(frame(), Some(Theme::Light)).unwrap();
        assert_eq!(out.source, frame().source);
        assert_eq!(out.image.to_rgba8().get_pixel(0, 0).0, [245, 235, 225, 255]);
    }

    #[test]
    fn test_failure_aborts_chain() {
        let mut chain = FilterChain::new();
        chain.push(Box::new(Invert));
        chain.push(Box::new(Failing));
        chain.push(Box::new(Invert));
        assert!(matches!(
            chain.apply(frame(), None),
            Err(FilterError::Failed { .. })
        ));
    }
}
