//! Profile records and update inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{Collection, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    FriendsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub relationship: Option<String>,
}

/// Reference to an uploaded image. `file_id` points at a file record but does
/// not own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    #[serde(default)]
    pub file_id: Option<String>,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePrivacy {
    pub visibility: Visibility,
    pub show_email: bool,
    pub show_phone: bool,
    pub show_location: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPrefs {
    pub email: bool,
    pub sms: bool,
    pub push: bool,
    pub marketing: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email: true,
            sms: false,
            push: true,
            marketing: false,
        }
    }
}

/// Extended personal data for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub account_id: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub emergency_contact: EmergencyContact,
    #[serde(default)]
    pub profile_picture: Option<MediaRef>,
    #[serde(default)]
    pub cover_photo: Option<MediaRef>,
    #[serde(default)]
    pub privacy: ProfilePrivacy,
    #[serde(default)]
    pub notification_prefs: NotificationPrefs,
    #[serde(default)]
    pub view_count: u64,
    /// Derived; see [`profile_completeness`](super::profile_completeness).
    #[serde(default)]
    pub completeness_percent: u8,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
    pub last_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// An empty profile with default flags.
    pub fn empty(account_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            bio: None,
            date_of_birth: None,
            gender: Gender::default(),
            location: Location::default(),
            social_links: SocialLinks::default(),
            emergency_contact: EmergencyContact::default(),
            profile_picture: None,
            cover_photo: None,
            privacy: ProfilePrivacy::default(),
            notification_prefs: NotificationPrefs::default(),
            view_count: 0,
            completeness_percent: 0,
            custom_fields: BTreeMap::new(),
            last_updated_at: now,
            created_at: now,
        }
    }
}

impl Record for Profile {
    const COLLECTION: Collection = Collection::Profiles;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.account_id.clone())
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.account_id)
    }
}

/// Partial profile update. Provided groups replace the stored group as a
/// whole; absent ones are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<ProfilePrivacy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_prefs: Option<NotificationPrefs>,
    /// Merged key by key; a JSON `null` removes the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, serde_json::Value>>,
}

impl ProfileUpdate {
    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn social_links(mut self, links: SocialLinks) -> Self {
        self.social_links = Some(links);
        self
    }

    /// Copy every provided field onto `profile`.
    pub(crate) fn apply_to(self, profile: &mut Profile) {
        if let Some(bio) = self.bio {
            let bio = bio.trim().to_string();
            profile.bio = (!bio.is_empty()).then_some(bio);
        }
        if let Some(date) = self.date_of_birth {
            profile.date_of_birth = Some(date);
        }
        if let Some(gender) = self.gender {
            profile.gender = gender;
        }
        if let Some(location) = self.location {
            profile.location = location;
        }
        if let Some(links) = self.social_links {
            profile.social_links = links;
        }
        if let Some(contact) = self.emergency_contact {
            profile.emergency_contact = contact;
        }
        if let Some(privacy) = self.privacy {
            profile.privacy = privacy;
        }
        if let Some(prefs) = self.notification_prefs {
            profile.notification_prefs = prefs;
        }
        if let Some(fields) = self.custom_fields {
            for (key, value) in fields {
                if value.is_null() {
                    profile.custom_fields.remove(&key);
                } else {
                    profile.custom_fields.insert(key, value);
                }
            }
        }
    }
}

/// Result of replacing a profile picture or cover photo.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaReplaced {
    pub profile: Profile,
    /// File that the profile referenced before, if it differs from the new one.
    pub stale_file_id: Option<String>,
}
