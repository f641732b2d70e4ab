//! Error types for the storage backends.
//!
//! Backends report structured errors rather than strings so that callers can
//! tell a missing document from a unique-key collision or an I/O failure.

use thiserror::Error;

use super::Collection;

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Document not found by ID.
    #[error("Document not found in {collection}: {id}")]
    DocumentNotFound {
        /// Collection that was searched
        collection: Collection,
        /// The ID of the document that was not found
        id: String,
    },

    /// A document with the same ID or unique key already exists.
    #[error("Duplicate key in {collection}: {key}")]
    DuplicateKey {
        /// Collection holding the conflicting document
        collection: Collection,
        /// The conflicting ID or unique key
        key: String,
    },

    /// A counter field holds something other than a non-negative integer.
    #[error("Field {field} in {collection} is not a counter")]
    InvalidCounter {
        /// Collection holding the document
        collection: Collection,
        /// The offending body field
        field: String,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// SQL backend error.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Context describing the failed operation
        reason: String,
        /// The underlying sqlx error, when there is one
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error indicates a document was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::DocumentNotFound { .. })
    }

    /// Check if this error indicates a unique constraint violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, BackendError::DuplicateKey { .. })
    }

    /// Check if this error is related to I/O or (de)serialization.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }

    /// The collection this error is about, if any.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            BackendError::DocumentNotFound { collection, .. }
            | BackendError::DuplicateKey { collection, .. }
            | BackendError::InvalidCounter { collection, .. } => Some(*collection),
            _ => None,
        }
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
