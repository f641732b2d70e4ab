//! Cascade deletion of an account and everything it owns.
//!
//! Each step runs regardless of whether earlier ones failed. There is no
//! rollback: a failed step leaves its records in place and is reported in
//! [`ServiceError::PartialCascadeFailure`].

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::Dossier;
use super::errors::ServiceError;
use crate::Result;
use crate::account::AccountError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CascadeStep {
    Account,
    Profile,
    Settings,
    FileRecords,
    StoredObjects,
}

/// A step that failed, with the error rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeFailure {
    pub step: CascadeStep,
    pub message: String,
}

/// What a cascade removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    pub account_id: String,
    pub account_deleted: bool,
    pub profile_deleted: bool,
    pub settings_deleted: bool,
    pub files_deleted: usize,
    pub objects_deleted: usize,
}

impl CascadeReport {
    fn deleted_anything(&self) -> bool {
        self.account_deleted
            || self.profile_deleted
            || self.settings_deleted
            || self.files_deleted > 0
    }
}

/// Map a step result to "deleted?", treating not-found as nothing to delete.
fn outcome<T>(
    step: CascadeStep,
    account_id: &str,
    result: Result<T>,
    failures: &mut Vec<CascadeFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            error!(account_id, ?step, error = %e, "Cascade delete step failed");
            failures.push(CascadeFailure {
                step,
                message: e.to_string(),
            });
            None
        }
    }
}

impl Dossier {
    /// Delete an account with its profile, settings, file records and stored
    /// file contents.
    ///
    /// Returns [`AccountError::NotFound`] when there was nothing at all to
    /// delete and [`ServiceError::PartialCascadeFailure`] when any step
    /// failed.
    pub async fn delete_account_cascade(&self, account_id: &str) -> Result<CascadeReport> {
        let mut failures = Vec::new();
        let mut report = CascadeReport {
            account_id: account_id.to_string(),
            ..CascadeReport::default()
        };

        let account = self.accounts().delete(account_id).await;
        report.account_deleted =
            outcome(CascadeStep::Account, account_id, account, &mut failures).is_some();

        let profile = self.profiles().delete(account_id).await;
        report.profile_deleted =
            outcome(CascadeStep::Profile, account_id, profile, &mut failures).is_some();

        let settings = self.settings().delete(account_id).await;
        report.settings_deleted =
            outcome(CascadeStep::Settings, account_id, settings, &mut failures).is_some();

        let files = self.files().delete_by_owner(account_id).await;
        let files = outcome(CascadeStep::FileRecords, account_id, files, &mut failures)
            .unwrap_or_default();
        report.files_deleted = files.len();

        for record in &files {
            match self.delete_stored_objects(record).await {
                Ok(removed) => report.objects_deleted += removed,
                Err(e) => {
                    error!(
                        account_id,
                        file_id = %record.id,
                        error = %e,
                        "Failed to delete stored file contents"
                    );
                    failures.push(CascadeFailure {
                        step: CascadeStep::StoredObjects,
                        message: format!("{}: {e}", record.id),
                    });
                }
            }
        }

        if !failures.is_empty() {
            warn!(account_id, failed = failures.len(), "Cascade delete incomplete");
            return Err(ServiceError::PartialCascadeFailure {
                account_id: account_id.to_string(),
                failures,
                report,
            }
            .into());
        }

        if !report.deleted_anything() {
            return Err(AccountError::NotFound {
                id: account_id.to_string(),
            }
            .into());
        }

        info!(
            account_id,
            files = report.files_deleted,
            objects = report.objects_deleted,
            "Cascade delete finished"
        );
        Ok(report)
    }
}
