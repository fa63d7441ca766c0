//! Execution module.
//!
//! This module runs filter chains and manages their on-disk results.

pub mod cache;
pub mod pipeline;
pub mod provider;
pub mod render;

pub use cache::{CacheStats, ImageCache};
pub use pipeline::FilterChain;
pub use provider::{DisplaySink, FileProvider, VaultProvider};
pub use render::{Rendered, Renderer};
