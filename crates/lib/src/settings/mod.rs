//! Settings record store.
//!
//! Preferences are grouped (general, privacy, notifications, security,
//! appearance, data management, communication, integrations) and updated one
//! leaf at a time by dotted path. Every update appends one entry to the row's
//! change history in the same write as the new value.

mod errors;
mod path;
mod store;
mod types;

pub use errors::SettingsError;
pub use path::SettingPath;
pub use store::SettingsStore;
pub use types::*;
