//!
//! Dossier: account, profile, settings and file records composed into one
//! complete user view.
//!
//! ## Core Concepts
//!
//! * **Backends (`backend::BackendImpl`)**: A pluggable storage layer holding four collections of JSON documents. `InMemory` (with JSON file persistence) and the sqlx-based `Sqlite`/`Postgres` backends are interchangeable.
//! * **Stores**: One per collection, each owning its record type and rules:
//!     * **AccountStore (`account::AccountStore`)**: Credentials, role and status, unique on normalized email.
//!     * **ProfileStore (`profile::ProfileStore`)**: One profile per account with a computed completeness score.
//!     * **SettingsStore (`settings::SettingsStore`)**: One preferences document per account, updated by dotted path with a change history.
//!     * **FileStore (`files::FileStore`)**: File metadata with versions, download counts and expiry.
//! * **Collaborators**: `auth::CredentialVerifier` hashes passwords, `auth::TokenIssuer` issues bearer tokens and `objstore::ObjectStore` holds file contents.
//! * **Dossier (`service::Dossier`)**: The aggregation service. It composes the stores into the complete user view and implements cascade deletion, uploads and export.

pub mod account;
pub mod auth;
pub mod backend;
pub mod clock;
pub mod constants;
pub mod files;
pub mod objstore;
pub mod profile;
pub mod service;
pub mod settings;

pub use clock::{Clock, FixedClock, SystemClock};
pub use service::{
    AdminSeed, CompleteUserView, Dossier, DossierBuilder, ExportSnapshot, ExportedDocument,
    Session, UploadRequest, UserStats,
};

/// Result type used throughout the Dossier library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Dossier library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured authentication errors from the auth module
    #[error(transparent)]
    Auth(auth::AuthError),

    /// Structured errors from the credential store
    #[error(transparent)]
    Account(account::AccountError),

    /// Structured errors from the profile store
    #[error(transparent)]
    Profile(profile::ProfileError),

    /// Structured errors from the settings store
    #[error(transparent)]
    Settings(settings::SettingsError),

    /// Structured errors from the file record store
    #[error(transparent)]
    File(files::FileError),

    /// Structured errors from an object store
    #[error(transparent)]
    ObjectStore(objstore::ObjectStoreError),

    /// Errors raised by the aggregation service itself
    #[error(transparent)]
    Service(service::ServiceError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Backend(_) => "backend",
            Error::Auth(_) => "auth",
            Error::Account(_) => "account",
            Error::Profile(_) => "profile",
            Error::Settings(_) => "settings",
            Error::File(_) => "files",
            Error::ObjectStore(_) => "objstore",
            Error::Service(_) => "service",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_not_found(),
            Error::Account(account_err) => account_err.is_not_found(),
            Error::Profile(profile_err) => profile_err.is_not_found(),
            Error::Settings(settings_err) => settings_err.is_not_found(),
            Error::File(file_err) => file_err.is_not_found(),
            Error::ObjectStore(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a uniqueness conflict.
    pub fn is_duplicate(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_duplicate_key(),
            Error::Account(account_err) => account_err.is_duplicate(),
            _ => false,
        }
    }

    /// Check if this error is caused by invalid input.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Account(account_err) => account_err.is_validation_error(),
            Error::Profile(profile_err) => profile_err.is_validation_error(),
            Error::Settings(settings_err) => settings_err.is_validation_error(),
            Error::File(file_err) => file_err.is_validation_error(),
            Error::ObjectStore(store_err) => store_err.is_invalid_key(),
            Error::Service(service_err) => service_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_invalid_token(),
            Error::Account(account_err) => account_err.is_authentication_error(),
            _ => false,
        }
    }

    /// Check if this error came from an object store.
    pub fn is_storage_backend_error(&self) -> bool {
        matches!(self, Error::ObjectStore(_))
    }

    /// Check if this error reports a cascade delete that did not finish.
    pub fn is_cascade_failure(&self) -> bool {
        match self {
            Error::Service(service_err) => service_err.is_cascade_failure(),
            _ => false,
        }
    }

    /// Check if this error is database/backend-related.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }
}
