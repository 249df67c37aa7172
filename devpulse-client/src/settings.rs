use larder::{PartialAppState, data_model::Timestamped};
use serde::{Deserialize, Serialize};

pub const SETTINGS_KEY: &str = "devpulse_settings_v1";

const fn dark_by_default() -> bool {
    true
}

/// Fields this client doesn't know about are carried through untouched, so other pages that
/// write to the same document don't lose their settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "dark_by_default")]
    pub dark_mode: bool,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: dark_by_default(),
            other: serde_json::Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEvent {
    SetDarkMode(bool),
}

impl PartialAppState for Settings {
    type Event = SettingsEvent;
    type Partial = Self;

    fn process_event(mut settings: Self, event: &Timestamped<SettingsEvent>) -> Self {
        match event.event {
            SettingsEvent::SetDarkMode(dark) => settings.preferences.dark_mode = dark,
        }
        settings
    }

    fn finalize(settings: Self) -> Self {
        settings
    }
}

impl Settings {
    pub fn dark_mode(&self) -> bool {
        self.preferences.dark_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder::{AppState as _, data_model::Stamper};

    #[test]
    fn test_dark_mode_defaults_on() {
        assert!(Settings::default().dark_mode());
        let settings: Settings = serde_json::from_str(r#"{"preferences":{}}"#).unwrap();
        assert!(settings.dark_mode());
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert!(settings.dark_mode());
    }

    #[test]
    fn test_unknown_fields_survive_a_theme_change() {
        let stored = r#"{"preferences":{"darkMode":true,"emailDigest":"weekly"},"locale":"en"}"#;
        let settings: Settings = serde_json::from_str(stored).unwrap();

        let mut stamper = Stamper::new();
        let settings = settings.apply_event(&stamper.stamp(SettingsEvent::SetDarkMode(false)));

        assert_eq!(
            serde_json::to_value(&settings).unwrap(),
            serde_json::json!({
                "preferences": { "darkMode": false, "emailDigest": "weekly" },
                "locale": "en"
            })
        );
    }
}
