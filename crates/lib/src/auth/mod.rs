//! Authentication collaborators.
//!
//! Two boundaries live here: [`CredentialVerifier`] turns plaintext passwords
//! into stored hashes and checks them, and [`TokenIssuer`] issues and verifies
//! bearer tokens for authenticated accounts. The stores and the service only
//! see the traits; [`Argon2Verifier`] and [`JwtIssuer`] are the defaults.

pub mod errors;
pub mod password;
pub mod token;

pub use errors::AuthError;
pub use password::{Argon2Verifier, CredentialVerifier};
pub use token::{Claims, JwtIssuer, TokenConfig, TokenIssuer, extract_bearer_token};
