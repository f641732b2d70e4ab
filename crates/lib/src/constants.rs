//! Constants used throughout the Dossier library.
//!
//! Central definitions for collection names, field limits and defaults that
//! more than one module depends on.

/// Collection holding one document per account.
pub const ACCOUNTS: &str = "accounts";

/// Collection holding one profile document per account.
pub const PROFILES: &str = "profiles";

/// Collection holding one settings document per account.
pub const SETTINGS: &str = "settings";

/// Collection holding file metadata documents.
pub const FILES: &str = "files";

/// Maximum length of a profile bio, in characters.
pub const BIO_MAX_CHARS: usize = 500;

/// Maximum length of the auto-reply message setting, in characters.
pub const AUTO_REPLY_MAX_CHARS: usize = 200;

/// Minimum length of a plaintext password accepted at registration.
pub const PASSWORD_MIN_CHARS: usize = 3;

/// Timezone assigned to new settings rows. Any other value counts as a
/// completed signal in the overall completeness score.
pub const DEFAULT_TIMEZONE: &str = "UTC";
