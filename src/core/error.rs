//! Error types for Darkroom.
//!
//! Uses thiserror for structured errors with context. Errors are split by
//! concern so callers can tell what was recoverable:
//! - directive problems never abort a render (they are diagnostics)
//! - cache read problems are swallowed and logged
//! - everything on the miss path propagates

use std::path::PathBuf;
use thiserror::Error;

/// A directive that was skipped while scanning an annotation.
///
/// These are diagnostics, not failures: the parser keeps going and the
/// render proceeds with whatever directives did parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("Directive '@{name}' at offset {offset} has no closing parenthesis")]
    UnbalancedParentheses { name: String, offset: usize },

    #[error("Directive '@{name}' at offset {offset} has an unterminated quoted value")]
    UnterminatedQuote { name: String, offset: usize },

    #[error("Directive '@{name}' has an invalid argument key '{key}'")]
    InvalidKey { name: String, key: String },

    #[error("Directive '@{name}' has an invalid value for '{key}': {value}")]
    InvalidValue {
        name: String,
        key: String,
        value: String,
    },

    #[error("Unknown filter '@{name}'")]
    UnknownFilter { name: String },
}

/// Errors raised by a filter while transforming a buffer.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter '{filter}' cannot process this image: {reason}")]
    Unsupported { filter: String, reason: String },

    #[error("Filter '{filter}' failed: {reason}")]
    Failed { filter: String, reason: String },
}

/// Errors from a [`FileProvider`](crate::execution::provider::FileProvider).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {error}")]
    Network { url: String, error: String },

    #[error("'{identity}' is not inside the vault")]
    OutsideVault { identity: String },
}

/// Errors that abort a single render attempt.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Could not load source: {0}")]
    Source(#[from] ProviderError),

    #[error("Could not decode {identity}: {source}")]
    Decode {
        identity: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Could not encode result for {identity}: {source}")]
    Encode {
        identity: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Filter chain failed: {0}")]
    Filter(#[from] FilterError),

    #[error("Could not write cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ============================================================================
// Error Utilities
// ============================================================================

impl DirectiveError {
    /// Name of the directive this diagnostic refers to.
    pub fn directive(&self) -> &str {
        match self {
            DirectiveError::UnbalancedParentheses { name, .. }
            | DirectiveError::UnterminatedQuote { name, .. }
            | DirectiveError::InvalidKey { name, .. }
            | DirectiveError::InvalidValue { name, .. }
            | DirectiveError::UnknownFilter { name } => name,
        }
    }
}

impl RenderError {
    /// Whether a later attempt with the same inputs could succeed.
    ///
    /// Decode and filter failures are deterministic; I/O and network failures
    /// are not.
    pub fn is_transient(&self) -> bool {
        match self {
            RenderError::Source(ProviderError::OutsideVault { .. }) => false,
            RenderError::Source(_) | RenderError::CacheWrite { .. } => true,
            _ => false,
        }
    }
}

/// Result type alias for render attempts.
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_error_names() {
        let error = DirectiveError::InvalidKey {
            name: "contrast".to_string(),
            key: "a b".to_string(),
        };
        assert_eq!(error.directive(), "contrast");
        assert!(error.to_string().contains("a b"));
    }

    #[test]
    fn test_transient_errors() {
        let io = RenderError::Source(ProviderError::Io {
            path: PathBuf::from("a.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        });
        assert!(io.is_transient());

        let filter = RenderError::Filter(FilterError::Failed {
            filter: "sharpness".to_string(),
            reason: "boom".to_string(),
        });
        assert!(!filter.is_transient());
    }

    #[test]
    fn test_escaping_identity_is_not_transient() {
        let error = RenderError::Source(ProviderError::OutsideVault {
            identity: "../secret.png".to_string(),
        });
        assert!(!error.is_transient());
        assert!(error.to_string().contains("../secret.png"));
    }
}
