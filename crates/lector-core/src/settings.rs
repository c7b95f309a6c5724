//! User settings, partial updates, and validation.
//!
//! Settings are stored as a single JSON object under the
//! [`keys::SETTINGS`](crate::ports::keys::SETTINGS) store key. The
//! serialized field names (`voice_id`, `apiKey`) match the shape the
//! original browser extension persisted, so an existing store file
//! keeps deserializing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{KeyValueStore, StoreError, keys};

/// Language code applied on first run.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Voice id applied on first run.
pub const DEFAULT_VOICE_ID: &str = "fc854436-2dac-4d21-aa69-ae17b54e98eb";

/// Display name of the first-run voice.
pub const DEFAULT_VOICE_NAME: &str = "Emily";

/// A chosen voice: service identifier plus the display name shown to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelection {
    /// Service voice identifier.
    #[serde(rename = "voice_id")]
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

/// User settings read at the start of every read-aloud session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Language code the synthesis endpoint is addressed with (e.g. `en`).
    pub language: String,
    /// The voice to synthesize with.
    pub voice: VoiceSelection,
    /// Speech service API key. Empty until the user configures one.
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Settings as they look on first run, before the user changed
    /// anything.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            voice: VoiceSelection {
                id: DEFAULT_VOICE_ID.to_string(),
                name: DEFAULT_VOICE_NAME.to_string(),
            },
            api_key: String::new(),
        }
    }

    /// Load settings from `store`, falling back to defaults when the
    /// key is absent.
    pub async fn load_from(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        match store.get(keys::SETTINGS).await? {
            Some(value) => {
                serde_json::from_value(value).map_err(|e| StoreError::InvalidValue {
                    key: keys::SETTINGS.to_string(),
                    reason: e.to_string(),
                })
            }
            None => Ok(Self::with_defaults()),
        }
    }

    /// Persist settings to `store` under the shared settings key.
    pub async fn persist_to(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        let value = serde_json::to_value(self).map_err(|e| StoreError::InvalidValue {
            key: keys::SETTINGS.to_string(),
            reason: e.to_string(),
        })?;
        store.set(keys::SETTINGS, value).await
    }

    /// Apply a partial update. `None` fields leave the current value
    /// untouched.
    pub fn merge(&mut self, update: &SettingsUpdate) {
        if let Some(language) = &update.language {
            self.language = language.clone();
        }
        if let Some(id) = &update.voice_id {
            self.voice.id = id.clone();
        }
        if let Some(name) = &update.voice_name {
            self.voice.name = name.clone();
        }
        if let Some(api_key) = &update.api_key {
            self.api_key = api_key.clone();
        }
    }
}

/// Partial settings update. Each `Some` field replaces the stored
/// value; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub language: Option<String>,
    pub voice_id: Option<String>,
    pub voice_name: Option<String>,
    pub api_key: Option<String>,
}

impl SettingsUpdate {
    /// `true` when no field is set and merging would be a no-op.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.voice_id.is_none()
            && self.voice_name.is_none()
            && self.api_key.is_none()
    }
}

/// Why settings are not usable for a read-aloud session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// No API key configured.
    #[error("no API key configured - set one with `lector settings set --api-key <KEY>`")]
    MissingApiKey,

    /// No voice selected.
    #[error("no voice selected - pick one with `lector settings set --voice-id <ID>`")]
    MissingVoice,

    /// No language configured.
    #[error("no language configured")]
    MissingLanguage,
}

/// Check that settings are complete enough to start a session.
///
/// Whitespace-only values count as missing. The first problem found is
/// returned; the API key is checked first because it is the field users
/// most often have not set yet.
pub fn validate_for_reading(settings: &Settings) -> Result<(), SettingsError> {
    if settings.api_key.trim().is_empty() {
        return Err(SettingsError::MissingApiKey);
    }
    if settings.voice.id.trim().is_empty() {
        return Err(SettingsError::MissingVoice);
    }
    if settings.language.trim().is_empty() {
        return Err(SettingsError::MissingLanguage);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Settings {
        Settings {
            api_key: "nk-test".to_string(),
            ..Settings::with_defaults()
        }
    }

    #[test]
    fn defaults_pick_the_emily_voice() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.language, "en");
        assert_eq!(settings.voice.id, DEFAULT_VOICE_ID);
        assert_eq!(settings.voice.name, "Emily");
        assert!(settings.api_key.is_empty());
    }

    #[test]
    fn merge_replaces_only_set_fields() {
        let mut settings = configured();
        settings.merge(&SettingsUpdate {
            voice_id: Some("abc-123".to_string()),
            voice_name: Some("Marcus".to_string()),
            ..SettingsUpdate::default()
        });
        assert_eq!(settings.voice.id, "abc-123");
        assert_eq!(settings.voice.name, "Marcus");
        assert_eq!(settings.language, "en");
        assert_eq!(settings.api_key, "nk-test");
    }

    #[test]
    fn merge_with_empty_update_is_a_noop() {
        let mut settings = configured();
        let before = settings.clone();
        let update = SettingsUpdate::default();
        assert!(update.is_empty());
        settings.merge(&update);
        assert_eq!(settings, before);
    }

    #[test]
    fn merge_can_clear_the_api_key() {
        let mut settings = configured();
        settings.merge(&SettingsUpdate {
            api_key: Some(String::new()),
            ..SettingsUpdate::default()
        });
        assert!(settings.api_key.is_empty());
    }

    #[test]
    fn validate_rejects_missing_api_key() {
        let settings = Settings::with_defaults();
        assert!(matches!(
            validate_for_reading(&settings),
            Err(SettingsError::MissingApiKey)
        ));
    }

    #[test]
    fn validate_rejects_whitespace_api_key() {
        let mut settings = configured();
        settings.api_key = "   ".to_string();
        assert!(matches!(
            validate_for_reading(&settings),
            Err(SettingsError::MissingApiKey)
        ));
    }

    #[test]
    fn validate_rejects_missing_voice() {
        let mut settings = configured();
        settings.voice.id = String::new();
        assert!(matches!(
            validate_for_reading(&settings),
            Err(SettingsError::MissingVoice)
        ));
    }

    #[test]
    fn validate_rejects_missing_language() {
        let mut settings = configured();
        settings.language = String::new();
        assert!(matches!(
            validate_for_reading(&settings),
            Err(SettingsError::MissingLanguage)
        ));
    }

    #[test]
    fn validate_accepts_configured_settings() {
        assert!(validate_for_reading(&configured()).is_ok());
    }

    #[test]
    fn serialized_shape_matches_the_stored_format() {
        let settings = configured();
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["language"], "en");
        assert_eq!(value["voice"]["voice_id"], DEFAULT_VOICE_ID);
        assert_eq!(value["voice"]["name"], "Emily");
        assert_eq!(value["apiKey"], "nk-test");
    }

    #[test]
    fn deserializing_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"apiKey":"nk-x"}"#).unwrap();
        assert_eq!(settings.api_key, "nk-x");
        assert_eq!(settings.language, "en");
        assert_eq!(settings.voice.id, DEFAULT_VOICE_ID);
    }
}
