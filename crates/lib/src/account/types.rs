//! Account records and the values passed in and out of [`AccountStore`](super::AccountStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{Collection, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    #[default]
    User,
    Admin,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::User => "user",
            AccountRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

/// Stored account, including the password hash.
///
/// Never hand this to callers outside the library; use [`AccountView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    /// Trimmed and lowercased.
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: AccountRole,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Public projection without the password hash.
    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }
}

impl Record for Account {
    const COLLECTION: Collection = Collection::Accounts;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.clone())
    }
}

/// Everything about an account except its credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            phone_number: account.phone_number.clone(),
            role: account.role,
            status: account.status,
            last_login_at: account.last_login_at,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self::from(&account)
    }
}

/// Registration input.
///
/// `role` cannot be supplied through deserialization, so a registration
/// request can never grant itself admin.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, alias = "phone")]
    pub phone_number: Option<String>,
    #[serde(skip_deserializing)]
    pub role: AccountRole,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone_number", &self.phone_number)
            .field("role", &self.role)
            .finish()
    }
}

impl NewAccount {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            phone_number: None,
            role: AccountRole::User,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn with_role(mut self, role: AccountRole) -> Self {
        self.role = role;
        self
    }
}

/// Account counts by status and role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub admins: usize,
    pub users: usize,
}

impl AccountStats {
    pub(crate) fn tally<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Self {
        accounts
            .into_iter()
            .fold(Self::default(), |mut stats, account| {
                stats.total += 1;
                match account.status {
                    AccountStatus::Active => stats.active += 1,
                    AccountStatus::Inactive => stats.inactive += 1,
                }
                match account.role {
                    AccountRole::Admin => stats.admins += 1,
                    AccountRole::User => stats.users += 1,
                }
                stats
            })
    }
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
