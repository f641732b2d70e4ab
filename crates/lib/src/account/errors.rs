//! Error types for the credential store.

use thiserror::Error;

/// Errors raised by [`AccountStore`](super::AccountStore) and by the login flow.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account not found: {id}")]
    NotFound { id: String },

    #[error("No account with email: {email}")]
    EmailNotFound { email: String },

    #[error("An account with email {email} already exists")]
    DuplicateEmail { email: String },

    /// A field failed validation at creation.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account {id} is inactive")]
    AccountInactive { id: String },
}

impl AccountError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AccountError::NotFound { .. } | AccountError::EmailNotFound { .. }
        )
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, AccountError::DuplicateEmail { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, AccountError::Validation { .. })
    }

    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            AccountError::InvalidCredentials | AccountError::AccountInactive { .. }
        )
    }

    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        AccountError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<AccountError> for crate::Error {
    fn from(err: AccountError) -> Self {
        crate::Error::Account(err)
    }
}
