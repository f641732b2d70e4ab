//! The profile store.

use std::sync::Arc;

use tracing::{debug, info};

use super::completeness::profile_completeness;
use super::errors::ProfileError;
use super::types::{MediaRef, MediaReplaced, Profile, ProfileUpdate};
use crate::Result;
use crate::backend::Backend;
use crate::clock::Clock;
use crate::constants::BIO_MAX_CHARS;

/// Body field holding [`Profile::view_count`].
const VIEW_COUNT_FIELD: &str = "viewCount";

/// Which media slot of a profile to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot {
    ProfilePicture,
    CoverPhoto,
}

/// One profile per account, addressed by account ID.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    backend: Backend,
    clock: Arc<dyn Clock>,
}

impl ProfileStore {
    pub fn new(backend: Backend, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Return the account's profile, creating an empty one if needed.
    pub async fn get_or_create(&self, account_id: &str) -> Result<Profile> {
        if let Some(profile) = self.find(account_id).await? {
            return Ok(profile);
        }

        let profile = Profile::empty(account_id, self.clock.now());
        match self.backend.insert(&profile).await {
            Ok(()) => {
                debug!(account_id, "Created empty profile");
                Ok(profile)
            }
            // Lost a race with a concurrent creator; theirs wins.
            Err(e) if e.is_duplicate() => self.get(account_id).await,
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, account_id: &str) -> Result<Profile> {
        self.find(account_id).await?.ok_or_else(|| {
            ProfileError::NotFound {
                account_id: account_id.to_string(),
            }
            .into()
        })
    }

    /// Merge `update` into the profile, creating the profile if needed.
    ///
    /// Validation runs before anything is written, so a rejected update on an
    /// account without a profile does not leave an empty one behind.
    pub async fn update(&self, account_id: &str, update: ProfileUpdate) -> Result<Profile> {
        let Some(mut profile) = self.find(account_id).await? else {
            return self.create_with(account_id, update).await;
        };
        update.apply_to(&mut profile);
        self.validate(&profile)?;
        self.persist(&mut profile).await?;
        info!(account_id, completeness = profile.completeness_percent, "Updated profile");
        Ok(profile)
    }

    async fn create_with(&self, account_id: &str, update: ProfileUpdate) -> Result<Profile> {
        let mut profile = Profile::empty(account_id, self.clock.now());
        update.clone().apply_to(&mut profile);
        self.validate(&profile)?;
        profile.completeness_percent = profile_completeness(&profile);

        match self.backend.insert(&profile).await {
            Ok(()) => {}
            // Lost a race with a concurrent creator; apply on top of theirs.
            Err(e) if e.is_duplicate() => {
                profile = self.get(account_id).await?;
                update.apply_to(&mut profile);
                self.validate(&profile)?;
                self.persist(&mut profile).await?;
            }
            Err(e) => return Err(e),
        }
        info!(account_id, completeness = profile.completeness_percent, "Created profile");
        Ok(profile)
    }

    /// Point the profile picture at a new image.
    ///
    /// The previously referenced file is reported back in
    /// [`MediaReplaced::stale_file_id`] and is not deleted here.
    pub async fn set_profile_picture(
        &self,
        account_id: &str,
        media: MediaRef,
    ) -> Result<MediaReplaced> {
        self.set_media(account_id, MediaSlot::ProfilePicture, media)
            .await
    }

    /// Point the cover photo at a new image. See [`Self::set_profile_picture`].
    pub async fn set_cover_photo(&self, account_id: &str, media: MediaRef) -> Result<MediaReplaced> {
        self.set_media(account_id, MediaSlot::CoverPhoto, media)
            .await
    }

    pub async fn set_media(
        &self,
        account_id: &str,
        slot: MediaSlot,
        media: MediaRef,
    ) -> Result<MediaReplaced> {
        if media.url.trim().is_empty() {
            return Err(ProfileError::validation("url", "must not be empty").into());
        }

        let mut profile = self.get_or_create(account_id).await?;
        let field = match slot {
            MediaSlot::ProfilePicture => &mut profile.profile_picture,
            MediaSlot::CoverPhoto => &mut profile.cover_photo,
        };
        let previous = field.replace(media);
        let new_file_id = field.as_ref().and_then(|m| m.file_id.clone());
        let stale_file_id = previous
            .and_then(|m| m.file_id)
            .filter(|old| Some(old) != new_file_id.as_ref());

        self.persist(&mut profile).await?;
        debug!(account_id, ?slot, stale = ?stale_file_id, "Replaced profile media");
        Ok(MediaReplaced {
            profile,
            stale_file_id,
        })
    }

    /// Add one to the view counter. Completeness is left as stored.
    ///
    /// The increment runs inside the backend, so concurrent viewers each count.
    pub async fn increment_views(&self, account_id: &str) -> Result<Profile> {
        self.backend
            .increment_counter::<Profile>(account_id, VIEW_COUNT_FIELD)
            .await?
            .ok_or_else(|| {
                ProfileError::NotFound {
                    account_id: account_id.to_string(),
                }
                .into()
            })
    }

    /// Remove the account's profile and return it.
    pub async fn delete(&self, account_id: &str) -> Result<Profile> {
        let profile = self.get(account_id).await?;
        self.backend.remove::<Profile>(&profile.id).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.backend.count::<Profile>().await
    }

    async fn find(&self, account_id: &str) -> Result<Option<Profile>> {
        self.backend.find_by_unique_key::<Profile>(account_id).await
    }

    /// Recompute derived fields and write the profile back.
    async fn persist(&self, profile: &mut Profile) -> Result<()> {
        profile.completeness_percent = profile_completeness(profile);
        profile.last_updated_at = self.clock.now();
        self.backend.replace(profile).await
    }

    fn validate(&self, profile: &Profile) -> Result<()> {
        if let Some(bio) = &profile.bio
            && bio.chars().count() > BIO_MAX_CHARS
        {
            return Err(ProfileError::validation(
                "bio",
                format!("must be at most {BIO_MAX_CHARS} characters"),
            )
            .into());
        }
        if let Some(dob) = profile.date_of_birth
            && dob > self.clock.now().date_naive()
        {
            return Err(ProfileError::validation("dateOfBirth", "must not be in the future").into());
        }
        if let Some(coordinates) = profile.location.coordinates {
            if !(-90.0..=90.0).contains(&coordinates.latitude) {
                return Err(ProfileError::validation(
                    "location.coordinates.latitude",
                    "must be between -90 and 90",
                )
                .into());
            }
            if !(-180.0..=180.0).contains(&coordinates.longitude) {
                return Err(ProfileError::validation(
                    "location.coordinates.longitude",
                    "must be between -180 and 180",
                )
                .into());
            }
        }
        Ok(())
    }
}
