//! Collaborators at the edges of a render: where bytes come from and where
//! finished paths go.

use crate::core::descriptor::SourceDescriptor;
use crate::core::error::ProviderError;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// Largest remote body accepted, in bytes.
pub const MAX_REMOTE_BYTES: u64 = 64 * 1024 * 1024;

/// Resolves a descriptor to the raw, still encoded, image bytes.
pub trait FileProvider: Send + Sync {
    fn read_bytes(&self, descriptor: &SourceDescriptor) -> Result<Vec<u8>, ProviderError>;
}

/// Receives the path of a finished render, e.g. to swap the displayed image.
pub trait DisplaySink {
    fn display(&self, path: &Path);
}

impl<F: Fn(&Path)> DisplaySink for F {
    fn display(&self, path: &Path) {
        self(path)
    }
}

/// Reads vault files from disk and fetches `http(s)` identities over the
/// network. Requests are made once; there is no retry.
#[derive(Debug, Clone)]
pub struct VaultProvider {
    root: PathBuf,
}

impl VaultProvider {
    /// Create a provider for the vault at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Vault root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault identities are relative and may not climb out of the root.
    fn read_local(&self, identity: &str) -> Result<Vec<u8>, ProviderError> {
        let confined = Path::new(identity)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !confined {
            return Err(ProviderError::OutsideVault {
                identity: identity.to_string(),
            });
        }

        let path = self.root.join(identity);
        std::fs::read(&path).map_err(|source| ProviderError::Io { path, source })
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let network = |error: String| ProviderError::Network {
            url: url.to_string(),
            error,
        };

        let response = ureq::get(url).call().map_err(|e| network(e.to_string()))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_REMOTE_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| network(e.to_string()))?;
        log::debug!("[provider] fetched {} ({} bytes)", url, bytes.len());
        Ok(bytes)
    }
}

impl FileProvider for VaultProvider {
    fn read_bytes(&self, descriptor: &SourceDescriptor) -> Result<Vec<u8>, ProviderError> {
        if descriptor.is_remote() {
            self.fetch(descriptor.identity())
        } else {
            self.read_local(descriptor.identity())
        }
    }
}
