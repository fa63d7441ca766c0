//! Render orchestration: annotation in, cache path out.
//!
//! A render parses the annotation, checks the cache and on a miss loads,
//! decodes, filters, encodes and stores the image. Renders for different
//! keys run in parallel; concurrent misses for the same key are serialized
//! so the image is only built once.

use crate::core::descriptor::SourceDescriptor;
use crate::core::error::{RenderError, RenderResult};
use crate::core::filter::Frame;
use crate::core::types::{normalize_8bit, Theme};
use crate::execution::cache::ImageCache;
use crate::execution::pipeline::FilterChain;
use crate::execution::provider::{DisplaySink, FileProvider};
use crate::filters::registry::FilterRegistry;
use crate::parser::parse_filters;
use image::ImageFormat;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a render attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// The annotation requested no known filters.
    NoFilters,
    /// A fresh entry already existed.
    Cached(PathBuf),
    /// The entry was built by this call.
    Created(PathBuf),
}

impl Rendered {
    /// Cache path, if any filters were requested.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Rendered::NoFilters => None,
            Rendered::Cached(path) | Rendered::Created(path) => Some(path.as_path()),
        }
    }
}

/// Drives renders against one cache and one byte provider.
pub struct Renderer<P> {
    registry: FilterRegistry,
    cache: ImageCache,
    provider: P,
    in_flight: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl<P: FileProvider> Renderer<P> {
    /// Create a renderer.
    pub fn new(registry: FilterRegistry, cache: ImageCache, provider: P) -> Self {
        Self {
            registry,
            cache,
            provider,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Filter registry used to resolve directives.
    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Underlying cache.
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Byte provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Render `source` with the filters named in `annotation`.
    pub fn render(
        &self,
        source: &SourceDescriptor,
        annotation: &str,
        theme: Option<Theme>,
    ) -> RenderResult<Rendered> {
        let chain = parse_filters(annotation, &self.registry);
        if chain.is_empty() {
            return Ok(Rendered::NoFilters);
        }

        let signatures = chain.signatures();
        let path = self.cache.cache_path(source, &signatures, theme);
        if self.cache.is_fresh(source, &signatures, theme) {
            return Ok(Rendered::Cached(path));
        }

        let guard = self.key_lock(&path);
        let building = guard.lock();

        // Another render may have finished this key while we waited.
        if self.cache.is_fresh(source, &signatures, theme) {
            drop(building);
            self.release_key(&path, guard);
            return Ok(Rendered::Cached(path));
        }

        let start = Instant::now();
        let result = self.build(source, &chain, theme, &path);
        drop(building);
        self.release_key(&path, guard);
        result?;

        log::info!(
            "[render] {} -> {} ({} filters) in {:?}",
            source,
            path.display(),
            chain.len(),
            start.elapsed()
        );
        Ok(Rendered::Created(path))
    }

    /// Render and hand the result to `sink`.
    ///
    /// Failures are logged and leave the sink untouched. Returns whether the
    /// sink received a path.
    pub fn present(
        &self,
        source: &SourceDescriptor,
        annotation: &str,
        theme: Option<Theme>,
        sink: &dyn DisplaySink,
    ) -> bool {
        match self.render(source, annotation, theme) {
            Ok(rendered) => match rendered.path() {
                Some(path) => {
                    sink.display(path);
                    true
                }
                None => false,
            },
            Err(e) => {
                log::error!("[render] {} failed: {}", source, e);
                false
            }
        }
    }

    /// Drop every cached variant of a source that changed on disk.
    pub fn invalidate(&self, source: &SourceDescriptor) -> usize {
        self.cache.clear_all_for_file(source)
    }

    /// Remove every cache entry.
    pub fn clear_entire_cache(&self) -> usize {
        self.cache.clear_entire_cache()
    }

    /// Move the cache to another directory.
    pub fn set_cache_dir(&mut self, cache_dir: impl Into<PathBuf>) {
        self.cache.set_cache_dir(cache_dir);
    }

    fn build(
        &self,
        source: &SourceDescriptor,
        chain: &FilterChain,
        theme: Option<Theme>,
        path: &Path,
    ) -> RenderResult<()> {
        let bytes = self.provider.read_bytes(source)?;
        let image = image::load_from_memory(&bytes).map_err(|e| RenderError::Decode {
            identity: source.identity().to_string(),
            source: e,
        })?;

        let frame = chain.apply(Frame::new(normalize_8bit(image), source.clone()), theme)?;

        let mut encoded = Cursor::new(Vec::new());
        frame
            .image
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(|e| RenderError::Encode {
                identity: source.identity().to_string(),
                source: e,
            })?;

        self.cache
            .write(path, encoded.get_ref())
            .map_err(|e| RenderError::CacheWrite {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn key_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.in_flight
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }

    fn release_key(&self, path: &Path, guard: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock();
        drop(guard);
        // Only the map still holds it: nobody else is waiting on this key.
        if in_flight.get(path).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            in_flight.remove(path);
        }
    }
}

impl<P> std::fmt::Debug for Renderer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .finish()
    }
}
