//! Core types shared across Darkroom.
//!
//! This module contains the foundational pieces that everything else builds on:
//! - Parameter values, themes and colors
//! - Source descriptors
//! - The ImageFilter trait
//! - Error types
//! - Configuration

pub mod config;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigStore, TomlConfigStore};
pub use descriptor::SourceDescriptor;
pub use filter::{Frame, ImageFilter};
pub use error::{DirectiveError, FilterError, ProviderError, RenderError};
pub use types::{Color, ParamValue, Parameters, Theme};
