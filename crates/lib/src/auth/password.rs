//! Password hashing behind the [`CredentialVerifier`] boundary.
//!
//! The default implementation uses Argon2id with a random salt per hash and
//! stores the result in PHC string format.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use super::errors::AuthError;
use crate::Result;

/// Hashes plaintext passwords and checks them against stored hashes.
pub trait CredentialVerifier: Send + Sync {
    /// Hash a plaintext password for storage.
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// Check a plaintext password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; only a hash that cannot be parsed is an error.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool>;
}

/// Argon2id verifier with the crate's default parameters.
#[derive(Debug, Clone, Default)]
pub struct Argon2Verifier {
    argon2: Argon2<'static>,
}

impl Argon2Verifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingFailed {
                reason: e.to_string(),
            })?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::MalformedHash {
            reason: e.to_string(),
        })?;
        Ok(self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}
