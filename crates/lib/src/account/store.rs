//! The credential store.

use std::sync::Arc;

use tracing::{debug, info};

use super::errors::AccountError;
use super::types::{Account, AccountRole, AccountStats, AccountStatus, NewAccount, normalize_email};
use crate::Result;
use crate::auth::CredentialVerifier;
use crate::backend::Backend;
use crate::clock::Clock;
use crate::constants::PASSWORD_MIN_CHARS;

/// Holds one record per account, keyed by ID and unique on email.
#[derive(Clone)]
pub struct AccountStore {
    backend: Backend,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("backend", &self.backend)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl AccountStore {
    pub fn new(
        backend: Backend,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            backend,
            clock,
            verifier,
        }
    }

    /// Validate, hash the password and persist a new account.
    ///
    /// Fails with [`AccountError::DuplicateEmail`] if the normalized email is
    /// taken.
    pub async fn create(&self, input: NewAccount) -> Result<Account> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AccountError::validation("name", "must not be empty").into());
        }
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        if input.password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(AccountError::validation(
                "password",
                format!("must be at least {PASSWORD_MIN_CHARS} characters"),
            )
            .into());
        }
        let phone_number = input
            .phone_number
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let password_hash = self.verifier.hash(&input.password)?;
        let now = self.clock.now();
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            password_hash,
            phone_number,
            role: input.role,
            status: AccountStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        match self.backend.insert(&account).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {
                return Err(AccountError::DuplicateEmail {
                    email: account.email,
                }
                .into());
            }
            Err(e) => return Err(e),
        }

        info!(account_id = %account.id, role = account.role.as_str(), "Created account");
        Ok(account)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Account> {
        debug!(account_id = %id, "Looking up account");
        self.backend
            .get::<Account>(id)
            .await?
            .ok_or_else(|| AccountError::NotFound { id: id.to_string() }.into())
    }

    /// Look up an account by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> Result<Account> {
        let email = normalize_email(email);
        self.backend
            .find_by_unique_key::<Account>(&email)
            .await?
            .ok_or_else(|| AccountError::EmailNotFound { email }.into())
    }

    pub async fn update_status(&self, id: &str, status: AccountStatus) -> Result<Account> {
        let account = self.modify(id, |account| account.status = status).await?;
        info!(account_id = %id, ?status, "Updated account status");
        Ok(account)
    }

    /// Change an account's role. Callers are responsible for checking that the
    /// actor is an admin.
    pub async fn set_role(&self, id: &str, role: AccountRole) -> Result<Account> {
        let account = self.modify(id, |account| account.role = role).await?;
        info!(account_id = %id, role = role.as_str(), "Updated account role");
        Ok(account)
    }

    /// Stamp `lastLoginAt` with the current time.
    pub async fn record_login(&self, id: &str) -> Result<Account> {
        let now = self.clock.now();
        self.modify(id, |account| account.last_login_at = Some(now))
            .await
    }

    /// Remove an account and return it.
    pub async fn delete(&self, id: &str) -> Result<Account> {
        match self.backend.remove::<Account>(id).await {
            Ok(account) => Ok(account),
            Err(e) if e.is_not_found() => Err(AccountError::NotFound { id: id.to_string() }.into()),
            Err(e) => Err(e),
        }
    }

    /// Every account, newest first.
    pub async fn list(&self) -> Result<Vec<Account>> {
        self.backend.list::<Account>().await
    }

    pub async fn count(&self) -> Result<usize> {
        self.backend.count::<Account>().await
    }

    pub async fn stats(&self) -> Result<AccountStats> {
        let accounts = self.list().await?;
        Ok(AccountStats::tally(&accounts))
    }

    /// Check a plaintext password against the account's stored hash.
    pub fn verify_password(&self, account: &Account, plaintext: &str) -> Result<bool> {
        self.verifier.verify(plaintext, &account.password_hash)
    }

    /// Load, mutate, bump `updatedAt` and write back.
    async fn modify<F>(&self, id: &str, apply: F) -> Result<Account>
    where
        F: FnOnce(&mut Account),
    {
        let mut account = self.find_by_id(id).await?;
        apply(&mut account);
        account.updated_at = self.clock.now();
        self.backend.replace(&account).await?;
        Ok(account)
    }
}

fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AccountError::validation("email", format!("'{email}' is not a valid address")).into())
    }
}
