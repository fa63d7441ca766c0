//! Identity and metadata of a source image.
//!
//! A descriptor never holds pixel data. It is built fresh for every render
//! attempt and is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Modification time used for remote sources, which have no change signal.
pub const REMOTE_MODIFIED_AT: u64 = u64::MAX;

/// Identity and metadata of a source image (local file or remote URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDescriptor {
    identity: String,
    display_name: String,
    base_name: String,
    modified_at_ms: u64,
}

impl SourceDescriptor {
    /// Create a descriptor from its raw parts.
    pub fn new(
        identity: impl Into<String>,
        display_name: impl Into<String>,
        base_name: impl Into<String>,
        modified_at_ms: u64,
    ) -> Self {
        Self {
            identity: identity.into(),
            display_name: display_name.into(),
            base_name: base_name.into(),
            modified_at_ms,
        }
    }

    /// Describe a file inside the vault.
    ///
    /// `relative_path` is the stable identity; the modification time is read
    /// from the file system.
    pub fn local(vault_root: &Path, relative_path: &str) -> io::Result<Self> {
        let metadata = std::fs::metadata(vault_root.join(relative_path))?;
        let modified = metadata.modified()?;
        let modified_at_ms = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        let path = Path::new(relative_path);
        let display_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(relative_path)
            .to_string();
        let base_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&display_name)
            .to_string();

        Ok(Self::new(relative_path, display_name, base_name, modified_at_ms))
    }

    /// Describe a remote image by its absolute URL.
    pub fn remote(url: &str) -> Self {
        let without_query = url.split(['?', '#']).next().unwrap_or(url);
        let display_name = without_query
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("remote")
            .to_string();
        let base_name = match display_name.rfind('.') {
            Some(dot) if dot > 0 => display_name[..dot].to_string(),
            _ => display_name.clone(),
        };

        Self::new(url, display_name, base_name, REMOTE_MODIFIED_AT)
    }

    /// Pick [`remote`](Self::remote) for `http(s)` locations and
    /// [`local`](Self::local) for everything else.
    pub fn from_location(vault_root: &Path, location: &str) -> io::Result<Self> {
        if is_remote_location(location) {
            Ok(Self::remote(location))
        } else {
            Self::local(vault_root, location)
        }
    }

    /// Stable path or absolute URL.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// File name including extension.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// File name without extension.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Source modification time in milliseconds since the Unix epoch.
    pub fn modified_at_ms(&self) -> u64 {
        self.modified_at_ms
    }

    /// Whether this descriptor has no modification signal.
    pub fn is_remote(&self) -> bool {
        self.modified_at_ms == REMOTE_MODIFIED_AT
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)
    }
}

/// Whether a location string names a remote resource.
pub fn is_remote_location(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_names() {
        let desc = SourceDescriptor::remote("https://example.com/img/diagram.v2.png?size=large#top");
        assert_eq!(desc.identity(), "https://example.com/img/diagram.v2.png?size=large#top");
        assert_eq!(desc.display_name(), "diagram.v2.png");
        assert_eq!(desc.base_name(), "diagram.v2");
        assert!(desc.is_remote());
        assert_eq!(desc.modified_at_ms(), u64::MAX);
    }

    #[test]
    fn test_remote_without_file_name() {
        let desc = SourceDescriptor::remote("https://example.com/");
        assert_eq!(desc.display_name(), "example.com");
    }

    #[test]
    fn test_local_reads_mtime() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/chart one.png"), b"x").unwrap();

        let desc = SourceDescriptor::local(dir.path(), "assets/chart one.png").unwrap();
        assert_eq!(desc.identity(), "assets/chart one.png");
        assert_eq!(desc.display_name(), "chart one.png");
        assert_eq!(desc.base_name(), "chart one");
        assert!(desc.modified_at_ms() > 0);
        assert!(!desc.is_remote());
    }

    #[test]
    fn test_local_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SourceDescriptor::local(dir.path(), "nope.png").is_err());
    }

    #[test]
    fn test_location_dispatch() {
        assert!(is_remote_location("HTTPS://x.org/a.png"));
        assert!(!is_remote_location("notes/a.png"));
        let desc = SourceDescriptor::from_location(Path::new("."), "http://x.org/a.png").unwrap();
        assert!(desc.is_remote());
    }
}
