//! Error types for the file record store.

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {file_id}")]
    NotFound { file_id: String },

    #[error("Invalid file {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl FileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileError::NotFound { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, FileError::Validation { .. })
    }

    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        FileError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<FileError> for crate::Error {
    fn from(err: FileError) -> Self {
        crate::Error::File(err)
    }
}
