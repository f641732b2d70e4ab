//! Error types for the profile store.

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("No profile for account {account_id}")]
    NotFound { account_id: String },

    #[error("Invalid profile {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl ProfileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProfileError::NotFound { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, ProfileError::Validation { .. })
    }

    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        ProfileError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ProfileError> for crate::Error {
    fn from(err: ProfileError) -> Self {
        crate::Error::Profile(err)
    }
}
