//! Configuration consumed by the core: where the cache lives and whether to
//! log verbosely.

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default cache directory, relative to the vault root.
pub const DEFAULT_CACHE_DIR: &str = ".obsidian/.dark-image-cache";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root that local identities and `cache_dir` are relative to.
    pub vault_root: PathBuf,
    /// Cache directory, relative to `vault_root`.
    pub cache_dir: PathBuf,
    /// Verbose logging. Has no behavioral effect.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_root: PathBuf::from("."),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            debug: false,
        }
    }
}

impl Config {
    /// Absolute (or vault-root relative) cache directory.
    pub fn absolute_cache_dir(&self) -> PathBuf {
        self.vault_root.join(&self.cache_dir)
    }
}

/// Where configuration is persisted.
pub trait ConfigStore: Send + Sync {
    /// Load configuration, falling back to defaults when nothing is stored.
    fn load(&self) -> Result<Config, ConfigError>;

    /// Persist configuration.
    fn save(&self, config: &Config) -> Result<(), ConfigError>;
}

/// Stores configuration as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    /// Create a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<Config, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[config] {} not found, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(config)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, text).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
        assert!(!config.debug);
        assert_eq!(
            config.absolute_cache_dir(),
            PathBuf::from(".").join(DEFAULT_CACHE_DIR)
        );
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path().join("darkroom.toml"));
        assert_eq!(store.load().unwrap(), Config::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path().join("nested/darkroom.toml"));
        let config = Config {
            vault_root: PathBuf::from("/vault"),
            cache_dir: PathBuf::from("cache"),
            debug: true,
        };

        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("darkroom.toml");
        std::fs::write(&path, "debug = true\n").unwrap();

        let config = TomlConfigStore::new(&path).load().unwrap();
        assert!(config.debug);
        assert_eq!(config.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("darkroom.toml");
        std::fs::write(&path, "debug = \"maybe\"\n").unwrap();

        let result = TomlConfigStore::new(&path).load();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
