//! # Darkroom - Alt-text driven image filters
//!
//! Darkroom reads short directives embedded in an image's alt-text, applies
//! the requested filters to the image and keeps the result in a
//! content-addressed disk cache, so repeated renders cost nothing.
//!
//! ## Features
//!
//! - **Directive language**: `@name` or `@name(key=value, flag, key="text")`
//! - **Filters**: invert, transparent, boost-lightness, contrast, sharpness
//!   and a theme-aware darkmode composite
//! - **Content-addressed cache**: keyed by source, filter chain and theme,
//!   invalidated by source modification time
//! - **Concurrent renders**: identical concurrent requests are built once
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use darkroom::prelude::*;
//!
//! let renderer = Renderer::new(
//!     FilterRegistry::with_builtins(),
//!     ImageCache::new("/path/to/vault", ".obsidian/.dark-image-cache"),
//!     VaultProvider::new("/path/to/vault"),
//! );
//!
//! let source = SourceDescriptor::local(Path::new("/path/to/vault"), "img/chart.png")?;
//! match renderer.render(&source, "A chart @darkmode", Some(Theme::Dark))? {
//!     Rendered::Cached(path) | Rendered::Created(path) => println!("{}", path.display()),
//!     Rendered::NoFilters => {}
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: shared types, the [`ImageFilter`](core::ImageFilter) trait,
//!   errors and configuration
//! - [`parser`]: the directive scanner
//! - [`filters`]: filter registry and built-in filters
//! - [`execution`]: filter chains, the disk cache and the renderer
//!
//! ## Custom Filters
//!
//! Implement [`ImageFilter`](core::ImageFilter) and register a factory:
//!
//! ```rust,ignore
//! use darkroom::prelude::*;
//!
//! #[derive(Debug)]
//! struct Grayscale;
//!
//! impl ImageFilter for Grayscale {
//!     fn name(&self) -> &'static str { "grayscale" }
//!     fn signature(&self) -> String { "grayscale".to_string() }
//!     fn apply(&self, frame: Frame, _theme: Option<Theme>) -> Result<Frame, FilterError> {
//!         let image = frame.image.grayscale();
//!         Ok(frame.with_image(image))
//!     }
//! }
//!
//! let mut registry = FilterRegistry::with_builtins();
//! registry.register("grayscale", |_| Box::new(Grayscale));
//! ```

#![warn(clippy::all)]

pub mod core;
pub mod execution;
pub mod filters;
pub mod parser;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use darkroom::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::descriptor::SourceDescriptor;
    pub use crate::core::filter::{Frame, ImageFilter};
    pub use crate::core::types::{Color, ParamValue, Parameters, Theme};

    // Configuration
    pub use crate::core::config::{Config, ConfigStore, TomlConfigStore};

    // Errors
    pub use crate::core::error::{
        ConfigError, DirectiveError, FilterError, ProviderError, RenderError, RenderResult,
    };

    // Parsing
    pub use crate::parser::{parse_filters, DirectiveParser, FilterSpec, ParseOutput};

    // Execution
    pub use crate::execution::cache::{CacheStats, ImageCache};
    pub use crate::execution::pipeline::FilterChain;
    pub use crate::execution::provider::{DisplaySink, FileProvider, VaultProvider};
    pub use crate::execution::render::{Rendered, Renderer};

    // Filters
    pub use crate::filters::registry::{FilterFactory, FilterRegistry};
    pub use crate::filters::builtin::{
        BoostLightness, Contrast, DarkMode, Invert, Removal, Sharpness, Threshold, Transparent,
    };

    pub use std::path::Path;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "darkroom");
    }

    #[test]
    fn test_same_annotation_same_cache_path() {
        let dir = TempDir::new().unwrap();
        let registry = FilterRegistry::with_builtins();
        let cache = ImageCache::new(dir.path(), ".cache");
        let source = SourceDescriptor::new("a/b.png", "b.png", "b", 0);
        let text = r#"@transparent(threshold=20, remove="below") @boost-lightness(amount=1.1) @darkmode"#;

        let first = parse_filters(text, &registry).signatures();
        let second = parse_filters(text, &registry).signatures();
        assert_eq!(first, second);
        assert_eq!(
            cache.cache_path(&source, &first, Some(Theme::Light)),
            cache.cache_path(&source, &second, Some(Theme::Light))
        );
    }

    #[test]
    fn test_vault_render_round_trip() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("img")).unwrap();
        let img = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        DynamicImage::ImageRgba8(img)
            .save(dir.path().join("img/white.png"))
            .unwrap();

        let renderer = Renderer::new(
            FilterRegistry::with_builtins(),
            ImageCache::new(dir.path(), ".cache"),
            VaultProvider::new(dir.path()),
        );
        let source = SourceDescriptor::local(dir.path(), "img/white.png").unwrap();

        let rendered = renderer.render(&source, "@dark", None).unwrap();
        let path = rendered.path().unwrap();
        assert!(path.starts_with(dir.path().join(".cache")));
        let out = image::open(path).unwrap().to_rgba8();
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));

        assert!(matches!(
            renderer.render(&source, "@dark", None).unwrap(),
            Rendered::Cached(_)
        ));
        assert_eq!(renderer.clear_entire_cache(), 1);
    }
}
