//! Settings records.
//!
//! Preferences are plain typed structs; every group fills in its own defaults
//! so a freshly created row matches what a new account starts with.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{Collection, Record};
use crate::constants::DEFAULT_TIMEZONE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Ar,
    Zh,
    Ja,
    Ko,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MM/dd/yyyy")]
    MonthDayYear,
    #[serde(rename = "dd/MM/yyyy")]
    DayMonthYear,
    #[serde(rename = "yyyy-MM-dd")]
    Iso,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    pub language: Language,
    pub timezone: String,
    pub date_format: DateFormat,
    pub time_format: TimeFormat,
    pub currency: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            date_format: DateFormat::default(),
            time_format: TimeFormat::default(),
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileVisibility {
    #[default]
    Public,
    Private,
    FriendsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    pub show_online_status: bool,
    pub allow_search_engine_indexing: bool,
    pub data_processing_consent: bool,
    pub analytics_consent: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::default(),
            show_online_status: true,
            allow_search_engine_indexing: true,
            data_processing_consent: false,
            analytics_consent: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailFrequency {
    #[default]
    Instant,
    Daily,
    Weekly,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailTypes {
    pub security: bool,
    pub account: bool,
    pub marketing: bool,
    pub updates: bool,
    pub social: bool,
}

impl Default for EmailTypes {
    fn default() -> Self {
        Self {
            security: true,
            account: true,
            marketing: false,
            updates: true,
            social: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailNotifications {
    pub enabled: bool,
    pub frequency: EmailFrequency,
    pub types: EmailTypes,
}

impl Default for EmailNotifications {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: EmailFrequency::default(),
            types: EmailTypes::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmsTypes {
    pub security: bool,
    pub account: bool,
}

impl Default for SmsTypes {
    fn default() -> Self {
        Self {
            security: true,
            account: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmsNotifications {
    pub enabled: bool,
    pub types: SmsTypes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushTypes {
    pub messages: bool,
    pub updates: bool,
    pub marketing: bool,
}

impl Default for PushTypes {
    fn default() -> Self {
        Self {
            messages: true,
            updates: true,
            marketing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushNotifications {
    pub enabled: bool,
    pub types: PushTypes,
}

impl Default for PushNotifications {
    fn default() -> Self {
        Self {
            enabled: true,
            types: PushTypes::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email: EmailNotifications,
    pub sms: SmsNotifications,
    pub push: PushNotifications,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwoFactorMethod {
    Sms,
    #[default]
    Email,
    Authenticator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecuritySettings {
    pub two_factor_enabled: bool,
    pub two_factor_method: TwoFactorMethod,
    pub login_notifications: bool,
    pub session_timeout_hours: u32,
    pub allow_multiple_sessions: bool,
    pub password_change_reminder: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            two_factor_enabled: false,
            two_factor_method: TwoFactorMethod::default(),
            login_notifications: true,
            session_timeout_hours: 24,
            allow_multiple_sessions: true,
            password_change_reminder: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearanceSettings {
    pub theme: Theme,
    pub color_scheme: String,
    pub font_size: FontSize,
    pub reduced_motion: bool,
    pub high_contrast: bool,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            color_scheme: "blue".to_string(),
            font_size: FontSize::default(),
            reduced_motion: false,
            high_contrast: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

/// Export format preference, also the format argument of snapshot exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xml,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataManagementSettings {
    pub auto_backup: bool,
    pub backup_frequency: BackupFrequency,
    pub retention_days: u32,
    pub export_format: ExportFormat,
}

impl Default for DataManagementSettings {
    fn default() -> Self {
        Self {
            auto_backup: true,
            backup_frequency: BackupFrequency::default(),
            retention_days: 365,
            export_format: ExportFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactMethod {
    #[default]
    Email,
    Phone,
    Sms,
    InApp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunicationSettings {
    pub preferred_contact_method: ContactMethod,
    pub allow_direct_messages: bool,
    pub auto_reply_enabled: bool,
    /// Serialized as `null` when unset so the path stays addressable.
    pub auto_reply_message: Option<String>,
}

impl Default for CommunicationSettings {
    fn default() -> Self {
        Self {
            preferred_contact_method: ContactMethod::default(),
            allow_direct_messages: true,
            auto_reply_enabled: false,
            auto_reply_message: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLogin {
    pub google: bool,
    pub facebook: bool,
    pub twitter: bool,
    pub linkedin: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitTier {
    #[default]
    Basic,
    Standard,
    Premium,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiAccess {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub rate_limit_tier: RateLimitTier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationSettings {
    pub social_login: SocialLogin,
    pub api_access: ApiAccess,
}

/// Every preference group. Paths such as `appearance.theme` address leaves of
/// this struct's JSON form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub general: GeneralSettings,
    pub privacy: PrivacySettings,
    pub notifications: NotificationSettings,
    pub security: SecuritySettings,
    pub appearance: AppearanceSettings,
    pub data_management: DataManagementSettings,
    pub communication: CommunicationSettings,
    pub integrations: IntegrationSettings,
    /// Free-form values keyed by name, addressed as `customSettings.<key>`.
    pub custom_settings: BTreeMap<String, Value>,
}

/// One entry of the settings audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    pub setting_path: String,
    pub old_value: Value,
    pub new_value: Value,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

/// An account's settings row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: String,
    pub account_id: String,
    #[serde(flatten)]
    pub preferences: Preferences,
    /// Append-only.
    #[serde(default)]
    pub change_history: Vec<ChangeEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn with_defaults(account_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            preferences: Preferences::default(),
            change_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the timezone was changed away from the default.
    pub fn has_custom_timezone(&self) -> bool {
        self.preferences.general.timezone != DEFAULT_TIMEZONE
    }
}

impl Record for UserSettings {
    const COLLECTION: Collection = Collection::Settings;

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
