//! Credential store: one record per account.
//!
//! Emails are unique and compared case-insensitively. Passwords are hashed by
//! the injected [`CredentialVerifier`](crate::auth::CredentialVerifier) before
//! the record is written, and the hash never leaves this module except inside
//! [`Account`]; everything exposed to callers uses [`AccountView`].

mod errors;
mod store;
mod types;

pub use errors::AccountError;
pub use store::AccountStore;
pub use types::{
    Account, AccountRole, AccountStats, AccountStatus, AccountView, NewAccount, normalize_email,
};
