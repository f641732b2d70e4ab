//! Error types for the settings store.

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("No settings for account {account_id}")]
    NotFound { account_id: String },

    /// The path does not name a leaf setting.
    #[error("Unknown setting path: '{path}'")]
    UnknownPath { path: String },

    /// The value does not fit the setting's type or allowed values.
    #[error("Invalid value for '{path}': {reason}")]
    InvalidValue { path: String, reason: String },
}

impl SettingsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SettingsError::NotFound { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            SettingsError::UnknownPath { .. } | SettingsError::InvalidValue { .. }
        )
    }
}

impl From<SettingsError> for crate::Error {
    fn from(err: SettingsError) -> Self {
        crate::Error::Settings(err)
    }
}
