//! The settings store.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::errors::SettingsError;
use super::path::{self as setting_path, SettingPath};
use super::types::{ChangeEntry, UserSettings};
use crate::Result;
use crate::backend::Backend;
use crate::clock::Clock;

/// One settings row per account, with an audit trail of leaf changes.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    backend: Backend,
    clock: Arc<dyn Clock>,
}

impl SettingsStore {
    pub fn new(backend: Backend, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Return the account's settings, creating a row of defaults if needed.
    pub async fn get_or_create_defaults(&self, account_id: &str) -> Result<UserSettings> {
        if let Some(settings) = self.find(account_id).await? {
            return Ok(settings);
        }

        let settings = UserSettings::with_defaults(account_id, self.clock.now());
        match self.backend.insert(&settings).await {
            Ok(()) => {
                debug!(account_id, "Created default settings");
                Ok(settings)
            }
            Err(e) if e.is_duplicate() => self.get(account_id).await,
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, account_id: &str) -> Result<UserSettings> {
        self.find(account_id).await?.ok_or_else(|| {
            SettingsError::NotFound {
                account_id: account_id.to_string(),
            }
            .into()
        })
    }

    /// Set the leaf at `path` to `new_value`, recording who changed it.
    ///
    /// The row must already exist. The history entry and the new value are
    /// written together; on any error nothing is written.
    pub async fn update_setting(
        &self,
        account_id: &str,
        path: &str,
        new_value: Value,
        actor: &str,
    ) -> Result<UserSettings> {
        let path = SettingPath::parse(path)?;
        let mut settings = self.get(account_id).await?;

        let (preferences, old_value) =
            setting_path::set(&settings.preferences, &path, new_value.clone())?;
        let now = self.clock.now();

        settings.change_history.push(ChangeEntry {
            setting_path: path.to_string(),
            old_value,
            new_value,
            changed_at: now,
            changed_by: actor.to_string(),
        });
        settings.preferences = preferences;
        settings.updated_at = now;

        self.backend.replace(&settings).await?;
        info!(account_id, path = %path, actor, "Updated setting");
        Ok(settings)
    }

    /// Read a single leaf value.
    pub async fn get_setting(&self, account_id: &str, path: &str) -> Result<Value> {
        let path = SettingPath::parse(path)?;
        let settings = self.get(account_id).await?;
        setting_path::get(&settings.preferences, &path)
    }

    /// The audit trail, oldest first.
    pub async fn history(&self, account_id: &str) -> Result<Vec<ChangeEntry>> {
        Ok(self.get(account_id).await?.change_history)
    }

    /// Remove the account's settings row and return it.
    pub async fn delete(&self, account_id: &str) -> Result<UserSettings> {
        let settings = self.get(account_id).await?;
        self.backend.remove::<UserSettings>(&settings.id).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.backend.count::<UserSettings>().await
    }

    async fn find(&self, account_id: &str) -> Result<Option<UserSettings>> {
        self.backend
            .find_by_unique_key::<UserSettings>(account_id)
            .await
    }
}
