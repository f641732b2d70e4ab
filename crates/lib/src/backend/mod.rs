//! Backend implementations for Dossier storage
//!
//! This module provides the core [`BackendImpl`] trait and its implementations.
//! The trait stores [`Document`]s: a JSON body plus the handful of indexed
//! columns the stores query by (unique key, owner, tag, creation time,
//! expiry). The stores above it never see which engine is in use, so the
//! in-memory and SQL backends are interchangeable and selected at startup.

use std::any::Any;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::constants::{ACCOUNTS, FILES, PROFILES, SETTINGS};

pub mod database;
pub mod errors;
mod typed;

pub use errors::BackendError;
pub use typed::{Backend, Record};

/// One of the four logical collections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Accounts,
    Profiles,
    Settings,
    Files,
}

impl Collection {
    /// Every collection, in schema order.
    pub const ALL: [Collection; 4] = [
        Collection::Accounts,
        Collection::Profiles,
        Collection::Settings,
        Collection::Files,
    ];

    /// Name used for tables and persistence keys.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Accounts => ACCOUNTS,
            Collection::Profiles => PROFILES,
            Collection::Settings => SETTINGS,
            Collection::Files => FILES,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The unit of storage handled by a backend.
///
/// `body` is the serialized record; the other fields are copies of the
/// record's indexed values so that backends can filter without parsing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    /// Unique within the collection when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Creation time in epoch milliseconds; listings are ordered by it.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub body: String,
}

/// Order documents newest first, breaking ties by ID so listings are stable.
pub(crate) fn sort_newest_first(documents: &mut [Document]) {
    documents.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Storage trait abstracting the engine that holds the four collections.
///
/// Implementations must be `Send` and `Sync` so that one backend can be shared
/// by every store, and implement `Any` so the binary can downcast to
/// [`database::InMemory`] to persist it on shutdown.
///
/// Listing methods return documents ordered by `created_at` descending.
#[async_trait]
pub trait BackendImpl: Send + Sync + Any {
    /// Stores a new document.
    ///
    /// Fails with [`BackendError::DuplicateKey`] if the ID, or the unique key
    /// when present, is already taken in that collection.
    async fn insert(&self, collection: Collection, document: Document) -> Result<()>;

    /// Retrieves a document by ID, `None` if absent.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>>;

    /// Retrieves the document holding the given unique key, `None` if absent.
    async fn find_by_unique_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>>;

    /// Lists every document in a collection.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>>;

    /// Lists the documents owned by `owner_id`, optionally restricted to a tag.
    async fn list_by_owner(
        &self,
        collection: Collection,
        owner_id: &str,
        tag: Option<&str>,
    ) -> Result<Vec<Document>>;

    /// Overwrites an existing document with the same ID.
    ///
    /// Fails with [`BackendError::DocumentNotFound`] if no such document exists
    /// and with [`BackendError::DuplicateKey`] if the new unique key belongs to
    /// a different document.
    async fn replace(&self, collection: Collection, document: Document) -> Result<()>;

    /// Adds one to the integer field `field` of the body of the document
    /// holding unique key `key`, and returns the updated document.
    ///
    /// The read and the write happen as one step, so concurrent increments are
    /// never lost. A missing field counts as zero. Returns `None` if no
    /// document holds the key.
    async fn increment_counter(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
    ) -> Result<Option<Document>>;

    /// Removes a document and returns it.
    async fn remove(&self, collection: Collection, id: &str) -> Result<Document>;

    /// Removes every document owned by `owner_id` and returns them.
    async fn remove_by_owner(&self, collection: Collection, owner_id: &str)
    -> Result<Vec<Document>>;

    /// Removes every document whose `expires_at` is at or before `now_millis`.
    async fn remove_expired(&self, collection: Collection, now_millis: i64)
    -> Result<Vec<Document>>;

    /// Number of documents in a collection.
    async fn count(&self, collection: Collection) -> Result<usize>;

    /// Returns a reference to the backend as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}
