//! Error types for object stores.

use thiserror::Error;

/// Errors raised by an [`ObjectStore`](super::ObjectStore).
///
/// During uploads a mirror failure is reported through this type but is not
/// surfaced to the caller; see [`Dossier::upload_file`](crate::Dossier::upload_file).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// Reading or writing the underlying storage failed.
    #[error("Object store I/O error for {key}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// No object exists under the key.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// The key would escape the store or is empty.
    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// The store is not reachable at all.
    #[error("Object store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl ObjectStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ObjectStoreError::NotFound { .. })
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, ObjectStoreError::InvalidKey { .. })
    }
}

impl From<ObjectStoreError> for crate::Error {
    fn from(err: ObjectStoreError) -> Self {
        crate::Error::ObjectStore(err)
    }
}
