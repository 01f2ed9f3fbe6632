//! Blob Store Adapters
//!
//! [`FsBlobStore`] keeps blobs as files under `root/container/key` and
//! replaces them atomically through a temp-file rename, so readers never see
//! a partial write. [`InMemoryBlobStore`] backs tests.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{BlobError, BlobStore};

/// Filesystem-backed blob store.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. Directories are created on write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, container: &str, key: &str) -> PathBuf {
        self.root.join(container).join(key)
    }

    fn error(container: &str, key: &str, source: std::io::Error) -> BlobError {
        BlobError {
            container: container.to_string(),
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, container: &str, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        match tokio::fs::read(self.path(container, key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::error(container, key, e)),
        }
    }

    async fn put(&self, container: &str, key: &str, data: Vec<u8>) -> Result<(), BlobError> {
        let path = self.path(container, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::error(container, key, e))?;
        }

        // Write-then-rename keeps the previous blob intact until the new
        // one is complete.
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| Self::error(container, key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Self::error(container, key, e))?;

        Ok(())
    }
}

/// In-memory blob store for tests and development.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, container: &str, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        Ok(self
            .blobs
            .read()
            .get(&(container.to_string(), key.to_string()))
            .cloned())
    }

    async fn put(&self, container: &str, key: &str, data: Vec<u8>) -> Result<(), BlobError> {
        self.blobs
            .write()
            .insert((container.to_string(), key.to_string()), data);
        Ok(())
    }
}
