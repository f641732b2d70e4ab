//! The aggregation service.
//!
//! [`Dossier`] is the entry point for callers. It owns the four stores plus
//! the authentication and object-store collaborators, and implements the
//! operations that span more than one store: account creation with its
//! default profile and settings, login, the complete user view, uploads,
//! cascade deletion and export.

use std::sync::Arc;

use handle_trait::Handle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::account::{
    AccountError, AccountRole, AccountStats, AccountStatus, AccountStore, AccountView, NewAccount,
};
use crate::auth::{
    Argon2Verifier, Claims, CredentialVerifier, JwtIssuer, TokenConfig, TokenIssuer,
};
use crate::backend::{Backend, BackendImpl};
use crate::clock::{Clock, SystemClock};
use crate::files::{FileCategory, FileError, FileRecord, FileStore};
use crate::objstore::{InMemoryObjects, ObjectStore};
use crate::profile::{Profile, ProfileStore, ProfileUpdate};
use crate::settings::{SettingsStore, UserSettings};
use crate::Result;

mod cascade;
pub mod errors;
mod export;
mod upload;
mod view;

pub use cascade::{CascadeFailure, CascadeReport, CascadeStep};
pub use errors::ServiceError;
pub use export::{ExportSnapshot, ExportedDocument};
pub use upload::UploadRequest;
pub use view::CompleteUserView;

/// A logged-in account and its bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub account: AccountView,
    pub token: String,
}

/// Totals across every collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(flatten)]
    pub accounts: AccountStats,
    pub total_profiles: usize,
    pub total_settings: usize,
    pub total_files: usize,
}

/// Credentials for the administrator created at startup.
#[derive(Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Internal state for [`Dossier`].
pub(crate) struct DossierInternal {
    backend: Backend,
    clock: Arc<dyn Clock>,
    accounts: AccountStore,
    profiles: ProfileStore,
    settings: SettingsStore,
    files: FileStore,
    tokens: Arc<dyn TokenIssuer>,
    primary: Arc<dyn ObjectStore>,
    mirror: Option<Arc<dyn ObjectStore>>,
}

impl std::fmt::Debug for DossierInternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DossierInternal")
            .field("backend", &self.backend)
            .field("clock", &self.clock)
            .field("tokens", &"<TokenIssuer>")
            .field("primary", &self.primary.name())
            .field("mirror", &self.mirror.as_ref().map(|m| m.name()))
            .finish_non_exhaustive()
    }
}

/// User data aggregation over a storage backend.
///
/// `Dossier` is a cheap-to-clone handle around `Arc<DossierInternal>`; clones
/// share the same stores.
///
/// ## Example
///
/// ```
/// # use dossier::{Dossier, account::NewAccount, backend::database::InMemory};
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> dossier::Result<()> {
/// let dossier = Dossier::open(Arc::new(InMemory::new()))?;
///
/// let account = dossier
///     .create_account(NewAccount::new("Ada", "ada@example.com", "secret"))
///     .await?;
/// let view = dossier.get_complete_user_view(&account.id).await?;
/// assert_eq!(view.account.email, "ada@example.com");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Handle)]
pub struct Dossier {
    inner: Arc<DossierInternal>,
}

/// Configures the collaborators of a [`Dossier`].
///
/// Anything left unset gets a default: [`SystemClock`], [`Argon2Verifier`],
/// an [`InMemoryObjects`] primary store with no mirror, and a [`JwtIssuer`]
/// with a random secret.
pub struct DossierBuilder {
    backend: Arc<dyn BackendImpl>,
    clock: Option<Arc<dyn Clock>>,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    token_config: Option<TokenConfig>,
    tokens: Option<Arc<dyn TokenIssuer>>,
    primary: Option<Arc<dyn ObjectStore>>,
    mirror: Option<Arc<dyn ObjectStore>>,
}

impl DossierBuilder {
    pub fn new(backend: Arc<dyn BackendImpl>) -> Self {
        Self {
            backend,
            clock: None,
            verifier: None,
            token_config: None,
            tokens: None,
            primary: None,
            mirror: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Use a [`JwtIssuer`] built from `config`.
    pub fn token_config(mut self, config: TokenConfig) -> Self {
        self.token_config = Some(config);
        self
    }

    /// Use a custom token issuer. Takes precedence over [`Self::token_config`].
    pub fn token_issuer(mut self, tokens: Arc<dyn TokenIssuer>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn primary_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.primary = Some(store);
        self
    }

    pub fn mirror_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.mirror = Some(store);
        self
    }

    pub fn build(self) -> Result<Dossier> {
        let backend = Backend::new(self.backend);
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let verifier = self
            .verifier
            .unwrap_or_else(|| Arc::new(Argon2Verifier::new()));
        let tokens = match (self.tokens, self.token_config) {
            (Some(tokens), _) => tokens,
            (None, Some(config)) => Arc::new(JwtIssuer::new(config)?),
            (None, None) => Arc::new(JwtIssuer::new(TokenConfig::random())?),
        };
        let primary = self
            .primary
            .unwrap_or_else(|| Arc::new(InMemoryObjects::default()));

        let internal = DossierInternal {
            accounts: AccountStore::new(backend.clone(), Arc::clone(&clock), verifier),
            profiles: ProfileStore::new(backend.clone(), Arc::clone(&clock)),
            settings: SettingsStore::new(backend.clone(), Arc::clone(&clock)),
            files: FileStore::new(backend.clone(), Arc::clone(&clock)),
            backend,
            clock,
            tokens,
            primary,
            mirror: self.mirror,
        };
        Ok(Dossier {
            inner: Arc::new(internal),
        })
    }
}

impl Dossier {
    /// Open a service over `backend` with default collaborators.
    pub fn open(backend: Arc<dyn BackendImpl>) -> Result<Self> {
        DossierBuilder::new(backend).build()
    }

    pub fn builder(backend: Arc<dyn BackendImpl>) -> DossierBuilder {
        DossierBuilder::new(backend)
    }

    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    pub fn clock(&self) -> &dyn Clock {
        &*self.inner.clock
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.inner.accounts
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.inner.profiles
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn files(&self) -> &FileStore {
        &self.inner.files
    }

    pub fn primary_store(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.primary
    }

    pub fn mirror_store(&self) -> Option<&Arc<dyn ObjectStore>> {
        self.inner.mirror.as_ref()
    }

    // === Accounts ===

    /// Register an account and create its default profile and settings.
    pub async fn create_account(&self, input: NewAccount) -> Result<AccountView> {
        let account = self.accounts().create(input).await?;
        self.profiles().get_or_create(&account.id).await?;
        self.settings().get_or_create_defaults(&account.id).await?;
        Ok(account.view())
    }

    /// Create an account on an administrator's behalf with an explicit role
    /// and status. The profile and settings are created as for
    /// [`Self::create_account`].
    pub async fn create_account_as_admin(
        &self,
        input: NewAccount,
        role: AccountRole,
        status: AccountStatus,
    ) -> Result<AccountView> {
        let account = self.create_account(input.with_role(role)).await?;
        if account.status == status {
            return Ok(account);
        }
        self.set_account_status(&account.id, status).await
    }

    /// Check credentials, stamp the login time and issue a token.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        let account = match self.accounts().find_by_email(email).await {
            Ok(account) => account,
            Err(e) if e.is_not_found() => {
                debug!("Login attempt for unknown email");
                return Err(AccountError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };
        if !self.accounts().verify_password(&account, password)? {
            debug!(account_id = %account.id, "Login attempt with wrong password");
            return Err(AccountError::InvalidCredentials.into());
        }
        if !account.is_active() {
            return Err(AccountError::AccountInactive { id: account.id }.into());
        }

        let account = self.accounts().record_login(&account.id).await?;
        let view = account.view();
        let token = self.inner.tokens.issue(&view)?;
        info!(account_id = %view.id, "Account logged in");
        Ok(Session {
            account: view,
            token,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.inner.tokens.verify(token)
    }

    pub async fn get_account(&self, account_id: &str) -> Result<AccountView> {
        Ok(self.accounts().find_by_id(account_id).await?.view())
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountView>> {
        let accounts = self.accounts().list().await?;
        Ok(accounts.into_iter().map(AccountView::from).collect())
    }

    pub async fn set_account_status(
        &self,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<AccountView> {
        Ok(self
            .accounts()
            .update_status(account_id, status)
            .await?
            .view())
    }

    pub async fn set_account_role(&self, account_id: &str, role: AccountRole) -> Result<AccountView> {
        Ok(self.accounts().set_role(account_id, role).await?.view())
    }

    /// Create the administrator described by `seed` unless one already exists.
    ///
    /// An existing account with the seed's email is promoted rather than
    /// recreated. Returns `None` when an admin was already present.
    pub async fn ensure_admin(&self, seed: AdminSeed) -> Result<Option<AccountView>> {
        if self.accounts().stats().await?.admins > 0 {
            return Ok(None);
        }
        match self.accounts().find_by_email(&seed.email).await {
            Ok(existing) => {
                let promoted = self.set_account_role(&existing.id, AccountRole::Admin).await?;
                info!(account_id = %promoted.id, "Promoted existing account to admin");
                Ok(Some(promoted))
            }
            Err(e) if e.is_not_found() => {
                let input = NewAccount::new(seed.name, seed.email, seed.password)
                    .with_role(AccountRole::Admin);
                let created = self.create_account(input).await?;
                info!(account_id = %created.id, "Created initial admin account");
                Ok(Some(created))
            }
            Err(e) => Err(e),
        }
    }

    /// Totals across every collection.
    pub async fn user_stats(&self) -> Result<UserStats> {
        let (accounts, total_profiles, total_settings, total_files) = tokio::try_join!(
            self.accounts().stats(),
            self.profiles().count(),
            self.settings().count(),
            self.files().count(),
        )?;
        Ok(UserStats {
            accounts,
            total_profiles,
            total_settings,
            total_files,
        })
    }

    // === Profile and settings ===

    pub async fn update_profile(&self, account_id: &str, update: ProfileUpdate) -> Result<Profile> {
        self.accounts().find_by_id(account_id).await?;
        self.profiles().update(account_id, update).await
    }

    pub async fn increment_profile_views(&self, account_id: &str) -> Result<Profile> {
        self.profiles().increment_views(account_id).await
    }

    /// Set one preference by dotted path, recording `actor` in the history.
    pub async fn update_setting(
        &self,
        account_id: &str,
        path: &str,
        value: Value,
        actor: &str,
    ) -> Result<UserSettings> {
        self.settings()
            .update_setting(account_id, path, value, actor)
            .await
    }

    // === Files ===

    pub async fn list_files(
        &self,
        owner_id: &str,
        category: Option<FileCategory>,
    ) -> Result<Vec<FileRecord>> {
        self.files().list_by_owner(owner_id, category).await
    }

    pub async fn record_download(&self, file_id: &str) -> Result<FileRecord> {
        self.files().record_download(file_id).await
    }

    /// The record for the object stored under `storage_path`, if `viewer`
    /// may read it.
    ///
    /// Unknown paths and files the viewer may not read are both reported as
    /// not found.
    pub async fn readable_file(
        &self,
        storage_path: &str,
        viewer: Option<&str>,
    ) -> Result<FileRecord> {
        let not_found = || -> crate::Error {
            FileError::NotFound {
                file_id: storage_path.to_string(),
            }
            .into()
        };
        // Keys start with the owner's account ID.
        let Some((owner_id, _)) = storage_path.split_once('/') else {
            return Err(not_found());
        };
        match self.files().find_by_storage_path(owner_id, storage_path).await? {
            Some(record) if record.is_readable_by(viewer) => Ok(record),
            Some(record) => {
                debug!(file_id = %record.id, viewer = ?viewer, "Denied stored file");
                Err(not_found())
            }
            None => Err(not_found()),
        }
    }

    /// Drop expired file records and their stored contents.
    ///
    /// Content deletion is best-effort; the removed records are returned
    /// either way.
    pub async fn purge_expired_files(&self) -> Result<Vec<FileRecord>> {
        let expired = self.files().delete_expired().await?;
        for record in &expired {
            if let Err(e) = self.delete_stored_objects(record).await {
                warn!(file_id = %record.id, error = %e, "Failed to delete expired file contents");
            }
        }
        Ok(expired)
    }
}
