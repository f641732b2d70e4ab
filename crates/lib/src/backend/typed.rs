//! Typed access on top of a [`BackendImpl`].
//!
//! Stores work with their own record structs. [`Record`] describes how a
//! struct maps onto a [`Document`]'s indexed columns, and [`Backend`] does the
//! encode/decode around each call.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use super::{BackendError, BackendImpl, Collection, Document};
use crate::Result;

/// A record type persisted in one collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// The collection this record lives in.
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    /// Creation time in epoch milliseconds.
    fn created_at_millis(&self) -> i64;

    /// Value that must be unique across the collection.
    fn unique_key(&self) -> Option<String> {
        None
    }

    fn owner_id(&self) -> Option<&str> {
        None
    }

    fn tag(&self) -> Option<&str> {
        None
    }

    /// Expiry in epoch milliseconds.
    fn expires_at_millis(&self) -> Option<i64> {
        None
    }
}

impl Document {
    /// Serialize a record into a document, copying out its indexed values.
    pub fn encode<R: Record>(record: &R) -> Result<Self> {
        let body = serde_json::to_string(record)
            .map_err(|source| BackendError::SerializationFailed { source })?;
        Ok(Self {
            id: record.id().to_string(),
            unique_key: record.unique_key(),
            owner_id: record.owner_id().map(str::to_string),
            tag: record.tag().map(str::to_string),
            created_at: record.created_at_millis(),
            expires_at: record.expires_at_millis(),
            body,
        })
    }

    /// Deserialize the document body into a record.
    pub fn decode<R: Record>(&self) -> Result<R> {
        serde_json::from_str(&self.body)
            .map_err(|source| BackendError::DeserializationFailed { source }.into())
    }
}

fn decode_all<R: Record>(documents: Vec<Document>) -> Result<Vec<R>> {
    documents.iter().map(Document::decode).collect()
}

/// Shared, typed handle to the storage backend.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<dyn BackendImpl>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("inner", &"<BackendImpl>")
            .finish()
    }
}

impl Backend {
    pub fn new(inner: Arc<dyn BackendImpl>) -> Self {
        Self { inner }
    }

    /// The underlying untyped backend.
    pub fn as_backend_impl(&self) -> &Arc<dyn BackendImpl> {
        &self.inner
    }

    pub async fn insert<R: Record>(&self, record: &R) -> Result<()> {
        self.inner
            .insert(R::COLLECTION, Document::encode(record)?)
            .await
    }

    pub async fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        self.inner
            .get(R::COLLECTION, id)
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    pub async fn find_by_unique_key<R: Record>(&self, key: &str) -> Result<Option<R>> {
        self.inner
            .find_by_unique_key(R::COLLECTION, key)
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    pub async fn list<R: Record>(&self) -> Result<Vec<R>> {
        decode_all(self.inner.list(R::COLLECTION).await?)
    }

    pub async fn list_by_owner<R: Record>(
        &self,
        owner_id: &str,
        tag: Option<&str>,
    ) -> Result<Vec<R>> {
        decode_all(
            self.inner
                .list_by_owner(R::COLLECTION, owner_id, tag)
                .await?,
        )
    }

    pub async fn replace<R: Record>(&self, record: &R) -> Result<()> {
        self.inner
            .replace(R::COLLECTION, Document::encode(record)?)
            .await
    }

    /// See [`BackendImpl::increment_counter`].
    pub async fn increment_counter<R: Record>(&self, key: &str, field: &str) -> Result<Option<R>> {
        self.inner
            .increment_counter(R::COLLECTION, key, field)
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    pub async fn remove<R: Record>(&self, id: &str) -> Result<R> {
        self.inner.remove(R::COLLECTION, id).await?.decode()
    }

    pub async fn remove_by_owner<R: Record>(&self, owner_id: &str) -> Result<Vec<R>> {
        decode_all(self.inner.remove_by_owner(R::COLLECTION, owner_id).await?)
    }

    pub async fn remove_expired<R: Record>(&self, now_millis: i64) -> Result<Vec<R>> {
        decode_all(self.inner.remove_expired(R::COLLECTION, now_millis).await?)
    }

    pub async fn count<R: Record>(&self) -> Result<usize> {
        self.inner.count(R::COLLECTION).await
    }
}
