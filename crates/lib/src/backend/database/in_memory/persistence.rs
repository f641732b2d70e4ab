//! Persistence operations for the InMemory backend
//!
//! Serializes every collection to a single JSON file and reads it back,
//! rebuilding the unique-key indexes on load.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Deserializer, Serialize};

use super::{CollectionState, InMemory};
use crate::{
    Error, Result,
    backend::{Collection, Document, errors::BackendError, sort_newest_first},
};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk form of the backend.
#[derive(Serialize, Deserialize)]
struct SerializableDatabase {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    /// BTreeMap keeps the file layout stable between saves.
    #[serde(default)]
    collections: BTreeMap<Collection, Vec<Document>>,
}

pub(crate) async fn save_to_file<P: AsRef<Path>>(backend: &InMemory, path: P) -> Result<()> {
    let collections = {
        let guard = backend.collections.read().await;
        guard
            .iter()
            .map(|(collection, state)| {
                let mut documents: Vec<Document> = state.documents.values().cloned().collect();
                sort_newest_first(&mut documents);
                (*collection, documents)
            })
            .collect()
    };

    let serializable = SerializableDatabase {
        version: PERSISTENCE_VERSION,
        collections,
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })
}

pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => {
            let serializable: SerializableDatabase =
                serde_json::from_str(&json).map_err(|e| -> Error {
                    BackendError::DeserializationFailed { source: e }.into()
                })?;
            let collections = serializable
                .collections
                .into_iter()
                .map(|(collection, documents)| {
                    (collection, CollectionState::from_documents(documents))
                })
                .collect();
            Ok(InMemory {
                collections: tokio::sync::RwLock::new(collections),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InMemory::new()),
        Err(e) => Err(BackendError::FileIo { source: e }.into()),
    }
}
