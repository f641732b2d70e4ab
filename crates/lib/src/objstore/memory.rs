//! In-memory object store.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ObjectStore, ObjectStoreError, StoredObject, validate_key};
use crate::Result;

#[derive(Debug, Clone)]
struct Object {
    bytes: Vec<u8>,
    content_type: String,
}

/// Keeps objects in a map. URLs use the `mem://` scheme.
///
/// [`InMemoryObjects::set_available`] makes every call fail with
/// [`ObjectStoreError::Unavailable`], which is how mirror outages are exercised.
#[derive(Debug)]
pub struct InMemoryObjects {
    name: String,
    objects: RwLock<HashMap<String, Object>>,
    available: AtomicBool,
}

impl Default for InMemoryObjects {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl InMemoryObjects {
    /// `name` becomes the host part of generated URLs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Copy of the bytes stored under `key`.
    pub async fn read(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).map(|o| o.bytes.clone())
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ObjectStoreError::Unavailable {
                reason: format!("{} is offline", self.name),
            }
            .into())
        }
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjects {
    async fn put(&self, bytes: &[u8], key: &str, content_type: &str) -> Result<StoredObject> {
        self.check_available()?;
        validate_key(key)?;
        self.objects.write().await.insert(
            key.to_string(),
            Object {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("mem://{}/{key}", self.name),
        })
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.objects.write().await.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.objects.read().await.contains_key(key))
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
