use serde::{Deserialize, Serialize};

/// Interface language preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    It,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Medium,
    Large,
}

/// Per-account preferences, stored alongside the user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub language: Language,
    pub theme: Theme,
    pub notifications: bool,
    pub sound_effects: bool,
    pub font_size: FontSize,
    pub email_notifications: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::Ar,
            theme: Theme::Light,
            notifications: true,
            sound_effects: true,
            font_size: FontSize::Medium,
            email_notifications: true,
        }
    }
}
