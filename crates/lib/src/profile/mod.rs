//! Profile record store.
//!
//! Each account has at most one profile. Its `completenessPercent` is derived
//! by [`profile_completeness`] and recomputed by the store before every write
//! except view counting.

mod completeness;
mod errors;
mod store;
mod types;

pub use completeness::{is_filled, percent, profile_completeness};
pub use errors::ProfileError;
pub use store::{MediaSlot, ProfileStore};
pub use types::{
    Coordinates, EmergencyContact, Gender, Location, MediaRef, MediaReplaced, NotificationPrefs,
    Profile, ProfilePrivacy, ProfileUpdate, SocialLinks, Visibility,
};
