//! Typed dotted-path access to [`Preferences`].
//!
//! A path like `notifications.email.enabled` is resolved against the JSON
//! form of the preferences. Every component must name an existing key and the
//! last one must be a leaf (not an object). Writes go through the JSON form
//! and are deserialized back into [`Preferences`], so the field types and
//! enums decide which values are accepted.
//!
//! `customSettings.<key>` is the exception: any key may be written with any
//! JSON value, an unset key reads as `null`, and writing `null` removes it.

use serde_json::Value;

use super::errors::SettingsError;
use super::types::Preferences;
use crate::Result;
use crate::constants::AUTO_REPLY_MAX_CHARS;

/// Group holding [`Preferences::custom_settings`].
const CUSTOM_SETTINGS: &str = "customSettings";

/// A parsed, non-empty settings path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingPath {
    segments: Vec<String>,
}

impl SettingPath {
    /// Split on `.`, dropping empty components.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(SettingsError::UnknownPath {
                path: path.to_string(),
            }
            .into());
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The free-form key when the path is `customSettings.<key>`.
    pub fn custom_key(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [group, key] if group == CUSTOM_SETTINGS => Some(key),
            _ => None,
        }
    }

    fn is_custom(&self) -> bool {
        self.segments.first().is_some_and(|group| group == CUSTOM_SETTINGS)
    }
}

impl std::fmt::Display for SettingPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

fn to_json(preferences: &Preferences) -> Result<Value> {
    serde_json::to_value(preferences).map_err(|e| {
        SettingsError::InvalidValue {
            path: String::new(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Walk to the leaf named by `path`.
fn leaf_mut<'a>(root: &'a mut Value, path: &SettingPath) -> Result<&'a mut Value> {
    let unknown = || -> crate::Error {
        SettingsError::UnknownPath {
            path: path.to_string(),
        }
        .into()
    };

    // Custom values are opaque; nothing below their key is addressable.
    if path.is_custom() {
        return Err(unknown());
    }

    let mut current = root;
    for segment in path.segments() {
        current = current
            .as_object_mut()
            .and_then(|map| map.get_mut(segment))
            .ok_or_else(unknown)?;
    }
    if current.is_object() {
        return Err(unknown());
    }
    Ok(current)
}

/// Read the current value at `path`.
pub fn get(preferences: &Preferences, path: &SettingPath) -> Result<Value> {
    if let Some(key) = path.custom_key() {
        return Ok(preferences
            .custom_settings
            .get(key)
            .cloned()
            .unwrap_or(Value::Null));
    }
    let mut root = to_json(preferences)?;
    leaf_mut(&mut root, path).map(|leaf| leaf.take())
}

/// Write `value` at `path` and return the updated preferences together with
/// the value that was replaced. `preferences` itself is not modified.
pub fn set(
    preferences: &Preferences,
    path: &SettingPath,
    value: Value,
) -> Result<(Preferences, Value)> {
    if let Some(key) = path.custom_key() {
        let mut updated = preferences.clone();
        let old = if value.is_null() {
            updated.custom_settings.remove(key)
        } else {
            updated.custom_settings.insert(key.to_string(), value)
        };
        return Ok((updated, old.unwrap_or(Value::Null)));
    }

    let mut root = to_json(preferences)?;
    let leaf = leaf_mut(&mut root, path)?;
    let old = std::mem::replace(leaf, value);

    let updated: Preferences = serde_json::from_value(root).map_err(|e| SettingsError::InvalidValue {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    validate(&updated, path)?;
    Ok((updated, old))
}

/// Constraints the types alone do not express.
fn validate(preferences: &Preferences, path: &SettingPath) -> Result<()> {
    let invalid = |reason: &str| -> crate::Error {
        SettingsError::InvalidValue {
            path: path.to_string(),
            reason: reason.to_string(),
        }
        .into()
    };

    if let Some(message) = &preferences.communication.auto_reply_message
        && message.chars().count() > AUTO_REPLY_MAX_CHARS
    {
        return Err(invalid(&format!(
            "auto-reply message must be at most {AUTO_REPLY_MAX_CHARS} characters"
        )));
    }
    if preferences.security.session_timeout_hours == 0 {
        return Err(invalid("session timeout must be at least one hour"));
    }
    if preferences.data_management.retention_days == 0 {
        return Err(invalid("retention must be at least one day"));
    }
    if preferences.general.timezone.trim().is_empty() {
        return Err(invalid("timezone must not be empty"));
    }
    Ok(())
}
