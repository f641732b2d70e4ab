//! Authentication error types for the Dossier library.
//!
//! Covers both halves of the auth boundary: password hashing and verification,
//! and issuing and verifying bearer tokens.

use thiserror::Error as ThisError;

use crate::Error;

/// Errors that can occur during authentication operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum AuthError {
    /// The password hasher rejected its input.
    #[error("Password hashing failed: {reason}")]
    HashingFailed {
        /// Description of the hashing failure
        reason: String,
    },

    /// A stored hash could not be parsed as a PHC string.
    #[error("Malformed password hash: {reason}")]
    MalformedHash {
        /// Description of the parsing failure
        reason: String,
    },

    /// A token could not be signed.
    #[error("Failed to encode token: {reason}")]
    TokenEncoding {
        /// Description of the encoding failure
        reason: String,
    },

    /// A token was expired, tampered with or issued for someone else.
    #[error("Invalid token: {reason}")]
    InvalidToken {
        /// Why validation failed
        reason: String,
    },

    /// The signing secret is unusable.
    #[error("Invalid token secret: {reason}")]
    InvalidSecret {
        /// Why the secret was rejected
        reason: String,
    },
}

impl AuthError {
    /// Check if this error was caused by a bad token presented by a caller.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, AuthError::InvalidToken { .. })
    }

    /// Check if this error is a configuration problem rather than bad input.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, AuthError::InvalidSecret { .. })
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Auth(err)
    }
}
