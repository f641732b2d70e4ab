//! Object storage for uploaded file contents.
//!
//! File records only hold metadata; the bytes live in an [`ObjectStore`]. The
//! service writes every upload to a primary store and optionally copies it to
//! a mirror. Two implementations ship with the crate:
//!
//! - [`LocalDirectory`]: files under a root directory, served from a base URL
//! - [`InMemoryObjects`]: a map, for tests and ephemeral deployments

mod errors;
mod local;
mod memory;

use std::any::Any;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use errors::ObjectStoreError;
pub use local::LocalDirectory;
pub use memory::InMemoryObjects;

use crate::Result;

/// Location of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    /// URL the object can be fetched from.
    pub url: String,
}

/// Byte storage addressed by string keys.
#[async_trait]
pub trait ObjectStore: Send + Sync + Any {
    /// Store `bytes` under `key`, overwriting any previous object.
    async fn put(&self, bytes: &[u8], key: &str, content_type: &str) -> Result<StoredObject>;

    /// Delete the object under `key`. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Human readable name used in logs.
    fn name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

/// Reject keys that are empty or could address something outside the store.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key.starts_with('/') || key.contains('\\') {
        Some("key must be a relative path")
    } else if key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        Some("key contains an empty or relative path component")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ObjectStoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}
