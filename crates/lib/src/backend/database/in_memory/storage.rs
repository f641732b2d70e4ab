//! Core storage operations for the InMemory backend

use super::InMemory;
use crate::{
    Result,
    backend::{Collection, Document, errors::BackendError, sort_newest_first},
};

pub(crate) async fn insert(
    backend: &InMemory,
    collection: Collection,
    document: Document,
) -> Result<()> {
    let mut collections = backend.collections.write().await;
    let state = collections.entry(collection).or_default();

    if state.documents.contains_key(&document.id) {
        return Err(BackendError::DuplicateKey {
            collection,
            key: document.id,
        }
        .into());
    }
    if let Some(key) = &document.unique_key {
        if state.unique.contains_key(key) {
            return Err(BackendError::DuplicateKey {
                collection,
                key: key.clone(),
            }
            .into());
        }
        state.unique.insert(key.clone(), document.id.clone());
    }
    state.documents.insert(document.id.clone(), document);
    Ok(())
}

pub(crate) async fn get(
    backend: &InMemory,
    collection: Collection,
    id: &str,
) -> Result<Option<Document>> {
    let collections = backend.collections.read().await;
    Ok(collections
        .get(&collection)
        .and_then(|state| state.documents.get(id))
        .cloned())
}

pub(crate) async fn find_by_unique_key(
    backend: &InMemory,
    collection: Collection,
    key: &str,
) -> Result<Option<Document>> {
    let collections = backend.collections.read().await;
    Ok(collections.get(&collection).and_then(|state| {
        state
            .unique
            .get(key)
            .and_then(|id| state.documents.get(id))
            .cloned()
    }))
}

/// List the documents matching `filter`, newest first.
pub(crate) async fn list<F>(
    backend: &InMemory,
    collection: Collection,
    filter: F,
) -> Result<Vec<Document>>
where
    F: Fn(&Document) -> bool,
{
    let collections = backend.collections.read().await;
    let mut documents: Vec<Document> = collections
        .get(&collection)
        .map(|state| {
            state
                .documents
                .values()
                .filter(|doc| filter(doc))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    sort_newest_first(&mut documents);
    Ok(documents)
}

pub(crate) async fn replace(
    backend: &InMemory,
    collection: Collection,
    document: Document,
) -> Result<()> {
    let mut collections = backend.collections.write().await;
    let state = collections.entry(collection).or_default();

    let Some(existing) = state.documents.get(&document.id) else {
        return Err(BackendError::DocumentNotFound {
            collection,
            id: document.id,
        }
        .into());
    };

    if let Some(key) = &document.unique_key
        && let Some(holder) = state.unique.get(key)
        && holder != &document.id
    {
        return Err(BackendError::DuplicateKey {
            collection,
            key: key.clone(),
        }
        .into());
    }

    if let Some(old_key) = existing.unique_key.clone() {
        state.unique.remove(&old_key);
    }
    if let Some(key) = &document.unique_key {
        state.unique.insert(key.clone(), document.id.clone());
    }
    state.documents.insert(document.id.clone(), document);
    Ok(())
}

pub(crate) async fn remove(
    backend: &InMemory,
    collection: Collection,
    id: &str,
) -> Result<Document> {
    let mut collections = backend.collections.write().await;
    let removed = collections
        .get_mut(&collection)
        .and_then(|state| {
            let document = state.documents.remove(id)?;
            if let Some(key) = &document.unique_key {
                state.unique.remove(key);
            }
            Some(document)
        });

    removed.ok_or_else(|| {
        BackendError::DocumentNotFound {
            collection,
            id: id.to_string(),
        }
        .into()
    })
}

/// Remove every document matching `filter` and return them, newest first.
pub(crate) async fn remove_where<F>(
    backend: &InMemory,
    collection: Collection,
    filter: F,
) -> Result<Vec<Document>>
where
    F: Fn(&Document) -> bool,
{
    let mut collections = backend.collections.write().await;
    let Some(state) = collections.get_mut(&collection) else {
        return Ok(Vec::new());
    };

    let ids: Vec<String> = state
        .documents
        .values()
        .filter(|doc| filter(doc))
        .map(|doc| doc.id.clone())
        .collect();

    let mut removed = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(document) = state.documents.remove(&id) {
            if let Some(key) = &document.unique_key {
                state.unique.remove(key);
            }
            removed.push(document);
        }
    }
    sort_newest_first(&mut removed);
    Ok(removed)
}

/// Add one to a body field while holding the write lock.
pub(crate) async fn increment_counter(
    backend: &InMemory,
    collection: Collection,
    key: &str,
    field: &str,
) -> Result<Option<Document>> {
    let mut collections = backend.collections.write().await;
    let Some(state) = collections.get_mut(&collection) else {
        return Ok(None);
    };
    let Some(id) = state.unique.get(key).cloned() else {
        return Ok(None);
    };
    let Some(document) = state.documents.get_mut(&id) else {
        return Ok(None);
    };

    let mut body: serde_json::Value = serde_json::from_str(&document.body)
        .map_err(|source| BackendError::DeserializationFailed { source })?;
    let invalid = || BackendError::InvalidCounter {
        collection,
        field: field.to_string(),
    };
    let Some(fields) = body.as_object_mut() else {
        return Err(invalid().into());
    };
    let current = match fields.get(field) {
        None | Some(serde_json::Value::Null) => 0,
        Some(value) => value.as_u64().ok_or_else(invalid)?,
    };
    fields.insert(field.to_string(), serde_json::Value::from(current + 1));

    document.body = serde_json::to_string(&body)
        .map_err(|source| BackendError::SerializationFailed { source })?;
    Ok(Some(document.clone()))
}
