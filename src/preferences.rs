use crate::storage::{
    self, KEY_AI_AVATAR, KEY_PREFERENCES, KEY_THEME, KEY_USER_AVATAR, KeyValueStore, StorageResult,
};
use crate::theme::{AppliedTheme, SystemTheme, resolve_theme};
use crate::types::{
    DEFAULT_AI_AVATAR, DEFAULT_USER_AVATAR, DisplaySettings, PreferencesUpdate, ThemeMode,
    UserPreferences,
};
use base64::Engine;
use std::sync::Arc;

/// Predefined AI avatars offered by the settings view.
pub const AI_AVATAR_GALLERY: [&str; 6] = [
    "/avatars/ai-1.png",
    "/avatars/ai-2.png",
    "/avatars/ai-3.png",
    "/avatars/ai-4.png",
    "/avatars/ai-5.png",
    "/avatars/ai-6.png",
];

/// Which avatar a reset applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarSlot {
    User,
    Ai,
}

/// User preferences and display settings, persisted on every change.
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    preferences: UserPreferences,
    display: DisplaySettings,
}

impl PreferenceStore {
    /// Read both domains once. Corrupt data falls back to defaults for that
    /// domain only.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let preferences = load_preferences(store.as_ref());
        let display = load_display(store.as_ref());
        Self {
            store,
            preferences,
            display,
        }
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    /// Setters write through to the store first; a failed write leaves the
    /// in-memory values as they were.
    pub fn update_preferences(&mut self, update: PreferencesUpdate) -> StorageResult<()> {
        let mut updated = self.preferences.clone();
        update.apply_to(&mut updated);
        storage::set_json(self.store.as_ref(), KEY_PREFERENCES, &updated)?;
        self.preferences = updated;
        Ok(())
    }

    pub fn set_user_avatar(&mut self, avatar: impl Into<String>) -> StorageResult<()> {
        let avatar = avatar.into();
        self.store.set(KEY_USER_AVATAR, &avatar)?;
        self.display.user_avatar = avatar;
        Ok(())
    }

    pub fn set_ai_avatar(&mut self, avatar: impl Into<String>) -> StorageResult<()> {
        let avatar = avatar.into();
        self.store.set(KEY_AI_AVATAR, &avatar)?;
        self.display.ai_avatar = avatar;
        Ok(())
    }

    pub fn reset_avatar(&mut self, slot: AvatarSlot) -> StorageResult<()> {
        match slot {
            AvatarSlot::User => self.set_user_avatar(DEFAULT_USER_AVATAR),
            AvatarSlot::Ai => self.set_ai_avatar(DEFAULT_AI_AVATAR),
        }
    }

    pub fn set_theme(&mut self, theme: ThemeMode) -> StorageResult<()> {
        self.store.set(KEY_THEME, theme.as_str())?;
        self.display.theme = theme;
        Ok(())
    }

    /// Theme to apply right now; `System` is resolved against `system`.
    pub fn applied_theme(&self, system: SystemTheme) -> AppliedTheme {
        resolve_theme(self.display.theme, system)
    }
}

fn load_preferences(store: &dyn KeyValueStore) -> UserPreferences {
    // Stored objects may be partial; merge them over the defaults.
    let mut prefs = UserPreferences::default();
    if let Some(update) = storage::get_json::<PreferencesUpdate>(store, KEY_PREFERENCES) {
        update.apply_to(&mut prefs);
    }
    prefs
}

fn load_display(store: &dyn KeyValueStore) -> DisplaySettings {
    let mut display = DisplaySettings::default();
    if let Some(avatar) = store.get(KEY_USER_AVATAR).filter(|v| !v.is_empty()) {
        display.user_avatar = avatar;
    }
    if let Some(avatar) = store.get(KEY_AI_AVATAR).filter(|v| !v.is_empty()) {
        display.ai_avatar = avatar;
    }
    if let Some(raw) = store.get(KEY_THEME) {
        match ThemeMode::parse(&raw) {
            Some(theme) => display.theme = theme,
            None => tracing::warn!(value = %raw, "ignoring unknown stored theme"),
        }
    }
    display
}

/// Split a comma-separated interests field, dropping blank entries.
pub fn parse_interests(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|interest| !interest.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encode an uploaded image as a `data:` URL usable as an avatar reference.
pub fn avatar_data_url(mime_type: &str, data: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    format!("data:{mime_type};base64,{encoded}")
}
