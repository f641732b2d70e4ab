//! Directory-backed object store.

use std::any::Any;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ObjectStore, ObjectStoreError, StoredObject, validate_key};
use crate::Result;

/// Stores objects as files below `root`; URLs are `base_url/key`.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    root: PathBuf,
    base_url: String,
}

impl LocalDirectory {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read an object's bytes.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        match tokio::fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound {
                    key: key.to_string(),
                }
                .into())
            }
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn io_error(key: &str, source: std::io::Error) -> crate::Error {
        ObjectStoreError::Io {
            key: key.to_string(),
            source,
        }
        .into()
    }
}

#[async_trait]
impl ObjectStore for LocalDirectory {
    async fn put(&self, bytes: &[u8], key: &str, _content_type: &str) -> Result<StoredObject> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(key, e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Self::io_error(key, e))?;

        tracing::debug!(key, bytes = bytes.len(), root = %self.root.display(), "Stored object");
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("{}/{key}", self.base_url),
        })
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        tokio::fs::try_exists(self.root.join(key))
            .await
            .map_err(|e| Self::io_error(key, e))
    }

    fn name(&self) -> &'static str {
        "local-directory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
