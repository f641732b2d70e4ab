//! The complete user view: one account joined with everything it owns.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Dossier;
use crate::Result;
use crate::account::AccountView;
use crate::files::{FileRecord, FileStats};
use crate::profile::{Profile, is_filled, percent};
use crate::settings::UserSettings;

/// Signals counted by [`overall_completeness`].
const OVERALL_SIGNALS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUserView {
    pub account: AccountView,
    pub profile: Profile,
    pub settings: UserSettings,
    /// Newest first.
    pub files: Vec<FileRecord>,
    pub file_stats: FileStats,
    /// 0 to 100, across account, profile and settings.
    pub overall_completeness: u8,
}

/// Completeness across the whole user: name, email and phone from the
/// account; bio, date of birth, city and picture from the profile; and a
/// timezone other than the default from the settings.
pub fn overall_completeness(
    account: &AccountView,
    profile: &Profile,
    settings: &UserSettings,
) -> u8 {
    let signals = [
        is_filled(Some(&account.name)),
        is_filled(Some(&account.email)),
        is_filled(account.phone_number.as_deref()),
        is_filled(profile.bio.as_deref()),
        profile.date_of_birth.is_some(),
        is_filled(profile.location.city.as_deref()),
        is_filled(profile.profile_picture.as_ref().map(|p| p.url.as_str())),
        settings.has_custom_timezone(),
    ];
    let filled = signals.iter().filter(|s| **s).count();
    percent(filled, OVERALL_SIGNALS)
}

impl Dossier {
    /// Load an account with its profile, settings and files.
    ///
    /// The account is read first so an unknown ID fails before anything is
    /// created. The profile and settings are created with defaults if
    /// missing, and the remaining reads run concurrently; the first error
    /// wins.
    pub async fn get_complete_user_view(&self, account_id: &str) -> Result<CompleteUserView> {
        let account = self.accounts().find_by_id(account_id).await?.view();

        let (profile, settings, files, file_stats) = tokio::try_join!(
            self.profiles().get_or_create(account_id),
            self.settings().get_or_create_defaults(account_id),
            self.files().list_by_owner(account_id, None),
            self.files().stats_by_owner(account_id),
        )?;

        let overall_completeness = overall_completeness(&account, &profile, &settings);
        debug!(account_id, overall_completeness, files = files.len(), "Assembled user view");
        Ok(CompleteUserView {
            account,
            profile,
            settings,
            files,
            file_stats,
            overall_completeness,
        })
    }
}
