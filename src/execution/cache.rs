//! Content-addressed disk cache for rendered images.
//!
//! Each entry is a PNG whose file name encodes the source, the filter chain
//! and the theme:
//!
//! ```text
//! <base>_<hash12>_<sig1>_..._<sigN>[_<theme>].png
//! ```
//!
//! `hash12` is the first 12 hex characters of the SHA-256 of the source
//! identity. An entry is fresh when its modification time is at least the
//! source's. Everything except [`ImageCache::write`] is best effort: errors
//! are logged and treated as a miss.

use crate::core::descriptor::SourceDescriptor;
use crate::core::types::Theme;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// File extension of every cache entry.
pub const CACHE_EXTENSION: &str = "png";

/// Length of the identity hash embedded in file names.
pub const HASH_LEN: usize = 12;

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Freshness checks that found a usable entry.
    pub hits: u64,
    /// Freshness checks that did not.
    pub misses: u64,
    /// Entries written.
    pub writes: u64,
    /// Entries removed by clear operations.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit ratio.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Disk cache rooted at `<vault_root>/<cache_dir>`.
#[derive(Debug)]
pub struct ImageCache {
    vault_root: PathBuf,
    cache_dir: PathBuf,
    stats: Mutex<CacheStats>,
}

impl ImageCache {
    /// Create a cache. No I/O happens until the first write.
    pub fn new(vault_root: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            cache_dir: cache_dir.into(),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Cache directory relative to the vault root.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Vault root.
    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    /// Absolute cache directory.
    pub fn absolute_cache_dir(&self) -> PathBuf {
        self.vault_root.join(&self.cache_dir)
    }

    /// Point the cache at another directory and create it.
    ///
    /// Existing entries stay where they are.
    pub fn set_cache_dir(&mut self, cache_dir: impl Into<PathBuf>) {
        self.cache_dir = cache_dir.into();
        let dir = self.absolute_cache_dir();
        if let Err(e) = fs::create_dir_all(&dir) {
            log::error!("[cache] could not create {}: {}", dir.display(), e);
        }
    }

    /// First 12 hex characters of the identity's SHA-256.
    pub fn identity_hash(descriptor: &SourceDescriptor) -> String {
        let digest = Sha256::digest(descriptor.identity().as_bytes());
        let mut hex = format!("{:x}", digest);
        hex.truncate(HASH_LEN);
        hex
    }

    /// File name for an entry.
    pub fn cache_name(
        &self,
        descriptor: &SourceDescriptor,
        signatures: &[String],
        theme: Option<Theme>,
    ) -> String {
        let mut parts = vec![
            sanitize(descriptor.base_name()),
            Self::identity_hash(descriptor),
        ];
        parts.extend(signatures.iter().cloned());
        if let Some(theme) = theme {
            parts.push(theme.tag().to_string());
        }
        format!("{}.{}", parts.join("_"), CACHE_EXTENSION)
    }

    /// Absolute path of an entry.
    pub fn cache_path(
        &self,
        descriptor: &SourceDescriptor,
        signatures: &[String],
        theme: Option<Theme>,
    ) -> PathBuf {
        self.absolute_cache_dir()
            .join(self.cache_name(descriptor, signatures, theme))
    }

    /// Path of an entry relative to the vault root.
    pub fn relative_cache_path(
        &self,
        descriptor: &SourceDescriptor,
        signatures: &[String],
        theme: Option<Theme>,
    ) -> PathBuf {
        self.cache_dir
            .join(self.cache_name(descriptor, signatures, theme))
    }

    /// Whether a usable entry exists.
    ///
    /// Remote sources are fresh as soon as the entry exists. Any file system
    /// error counts as stale.
    pub fn is_fresh(
        &self,
        descriptor: &SourceDescriptor,
        signatures: &[String],
        theme: Option<Theme>,
    ) -> bool {
        let path = self.cache_path(descriptor, signatures, theme);
        let fresh = match entry_modified_ms(&path) {
            Ok(Some(modified)) => descriptor.is_remote() || modified >= descriptor.modified_at_ms(),
            Ok(None) => false,
            Err(e) => {
                log::warn!("[cache] freshness check failed for {}: {}", path.display(), e);
                false
            }
        };

        let mut stats = self.stats.lock();
        if fresh {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        log::debug!(
            "[cache] {} for {} ({})",
            if fresh { "hit" } else { "miss" },
            descriptor,
            path.display()
        );
        fresh
    }

    /// Store bytes at `path`, creating the directory if needed.
    ///
    /// The bytes go to a temporary file next to the target first and are
    /// renamed into place, so readers never observe a partial entry.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.absolute_cache_dir());
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(path).map_err(|e| e.error)?;

        self.stats.lock().writes += 1;
        log::debug!("[cache] wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Remove one entry. A missing entry is not an error.
    pub fn clear(&self, descriptor: &SourceDescriptor, signatures: &[String], theme: Option<Theme>) {
        let path = self.cache_path(descriptor, signatures, theme);
        if self.remove_entry(&path) {
            log::debug!("[cache] cleared {}", path.display());
        }
    }

    /// Remove every entry for one source, whatever its chain or theme.
    ///
    /// Returns the number of files removed.
    pub fn clear_all_for_file(&self, descriptor: &SourceDescriptor) -> usize {
        let hash = Self::identity_hash(descriptor);
        let removed = self.remove_matching(|name| name.contains(&hash));
        log::debug!("[cache] cleared {} entries for {}", removed, descriptor);
        removed
    }

    /// Remove every file in the cache directory.
    ///
    /// Returns the number of files removed.
    pub fn clear_entire_cache(&self) -> usize {
        let removed = self.remove_matching(|_| true);
        log::info!(
            "[cache] cleared {} entries from {}",
            removed,
            self.absolute_cache_dir().display()
        );
        removed
    }

    /// Snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    fn remove_entry(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                self.stats.lock().evictions += 1;
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                log::warn!("[cache] could not remove {}: {}", path.display(), e);
                false
            }
        }
    }

    fn remove_matching(&self, matches: impl Fn(&str) -> bool) -> usize {
        let dir = self.absolute_cache_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
            Err(e) => {
                log::warn!("[cache] could not list {}: {}", dir.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let matched = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(&matches);
            if matched && self.remove_entry(&path) {
                removed += 1;
            }
        }
        removed
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Modification time in ms, or `None` if the entry does not exist.
fn entry_modified_ms(path: &Path) -> io::Result<Option<u64>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let modified = metadata
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(u64::try_from(modified.as_millis()).unwrap_or(u64::MAX)))
}
