//! Completeness scoring.

use super::types::Profile;

/// `round(100 * filled / total)` with halves rounded up. Zero when `total` is
/// zero.
pub fn percent(filled: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let filled = filled.min(total);
    // Integer form of floor(100 * filled / total + 0.5).
    ((200 * filled + total) / (2 * total)) as u8
}

/// Whether an optional string counts as filled in.
pub fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Percentage of the six tracked profile fields that are filled in: bio, date
/// of birth, city, country, profile picture URL and LinkedIn link.
pub fn profile_completeness(profile: &Profile) -> u8 {
    let signals = [
        is_filled(profile.bio.as_deref()),
        profile.date_of_birth.is_some(),
        is_filled(profile.location.city.as_deref()),
        is_filled(profile.location.country.as_deref()),
        is_filled(profile.profile_picture.as_ref().map(|p| p.url.as_str())),
        is_filled(profile.social_links.linkedin.as_deref()),
    ];
    percent(signals.iter().filter(|s| **s).count(), signals.len())
}
