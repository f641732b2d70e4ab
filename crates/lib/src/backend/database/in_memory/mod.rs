//! In-memory database backend implementation
//!
//! This module provides an in-memory implementation of the [`BackendImpl`]
//! trait, suitable for testing, development, or single-node deployments where
//! the whole state is saved to a JSON file on shutdown.

mod persistence;
mod storage;

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::{BackendImpl, Collection, Document};

/// Documents of one collection plus its unique-key index.
#[derive(Debug, Default, Clone)]
pub(crate) struct CollectionState {
    pub(crate) documents: HashMap<String, Document>,
    /// unique_key -> document id
    pub(crate) unique: HashMap<String, String>,
}

impl CollectionState {
    /// Build the state from a list of documents, rebuilding the unique index.
    pub(crate) fn from_documents(documents: Vec<Document>) -> Self {
        let mut state = Self::default();
        for document in documents {
            if let Some(key) = &document.unique_key {
                state.unique.insert(key.clone(), document.id.clone());
            }
            state.documents.insert(document.id.clone(), document);
        }
        state
    }
}

/// A simple in-memory backend using `HashMap`s for storage.
///
/// It provides basic persistence via [`InMemory::save_to_file`] and
/// [`InMemory::load_from_file`], serializing every collection to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) collections: RwLock<HashMap<Collection, CollectionState>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the IDs of every document in a collection.
    pub async fn all_ids(&self, collection: Collection) -> Vec<String> {
        let collections = self.collections.read().await;
        collections
            .get(&collection)
            .map(|state| state.documents.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Saves the entire state to a file as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads the state from a JSON file.
    ///
    /// If the file does not exist, a new, empty `InMemory` backend is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl BackendImpl for InMemory {
    async fn insert(&self, collection: Collection, document: Document) -> Result<()> {
        storage::insert(self, collection, document).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        storage::get(self, collection, id).await
    }

    async fn find_by_unique_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>> {
        storage::find_by_unique_key(self, collection, key).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        storage::list(self, collection, |_| true).await
    }

    async fn list_by_owner(
        &self,
        collection: Collection,
        owner_id: &str,
        tag: Option<&str>,
    ) -> Result<Vec<Document>> {
        storage::list(self, collection, |doc| {
            doc.owner_id.as_deref() == Some(owner_id)
                && tag.is_none_or(|tag| doc.tag.as_deref() == Some(tag))
        })
        .await
    }

    async fn replace(&self, collection: Collection, document: Document) -> Result<()> {
        storage::replace(self, collection, document).await
    }

    async fn increment_counter(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
    ) -> Result<Option<Document>> {
        storage::increment_counter(self, collection, key, field).await
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<Document> {
        storage::remove(self, collection, id).await
    }

    async fn remove_by_owner(
        &self,
        collection: Collection,
        owner_id: &str,
    ) -> Result<Vec<Document>> {
        storage::remove_where(self, collection, |doc| {
            doc.owner_id.as_deref() == Some(owner_id)
        })
        .await
    }

    async fn remove_expired(
        &self,
        collection: Collection,
        now_millis: i64,
    ) -> Result<Vec<Document>> {
        storage::remove_where(self, collection, |doc| {
            doc.expires_at.is_some_and(|at| at <= now_millis)
        })
        .await
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|state| state.documents.len())
            .unwrap_or(0))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
