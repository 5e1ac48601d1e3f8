use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Raw image bytes attached to a user turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            file_name: None,
            data,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Guess the MIME type from a file extension, falling back to octet-stream.
    pub fn mime_for_extension(ext: &str) -> &'static str {
        match ext.to_ascii_lowercase().as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "heif" => "image/heif",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub image: Option<Arc<ImageAttachment>>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            image: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_image(mut self, image: Option<Arc<ImageAttachment>>) -> Self {
        self.image = image;
        self
    }

    /// A user message typed as a slash command.
    pub fn is_command(&self) -> bool {
        self.role == Role::User && self.content.trim_start().starts_with('/')
    }

    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A prior message as it travels over the wire: role and content only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger: String,
    pub response: String,
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        trigger: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            trigger: trigger.into(),
            response: response.into(),
        }
    }
}

pub const DEFAULT_USER_NAME: &str = "User";
pub const DEFAULT_RESPONSE_STYLE: &str = "helpful and concise";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub name: String,
    pub interests: Vec<String>,
    pub preferred_response_style: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            name: DEFAULT_USER_NAME.to_string(),
            interests: Vec::new(),
            preferred_response_style: DEFAULT_RESPONSE_STYLE.to_string(),
        }
    }
}

/// Partial update merged over the current [`UserPreferences`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub name: Option<String>,
    pub interests: Option<Vec<String>>,
    pub preferred_response_style: Option<String>,
}

impl PreferencesUpdate {
    pub fn apply_to(self, prefs: &mut UserPreferences) {
        if let Some(name) = self.name {
            prefs.name = name;
        }
        if let Some(interests) = self.interests {
            prefs.interests = interests;
        }
        if let Some(style) = self.preferred_response_style {
            prefs.preferred_response_style = style;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Dark,
    #[default]
    Light,
    System,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
            ThemeMode::System => "system",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(ThemeMode::Dark),
            "light" => Some(ThemeMode::Light),
            "system" => Some(ThemeMode::System),
            _ => None,
        }
    }
}

pub const DEFAULT_USER_AVATAR: &str = "/avatars/user.png";
pub const DEFAULT_AI_AVATAR: &str = "/avatars/ai.png";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplaySettings {
    pub user_avatar: String,
    pub ai_avatar: String,
    pub theme: ThemeMode,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            user_avatar: DEFAULT_USER_AVATAR.to_string(),
            ai_avatar: DEFAULT_AI_AVATAR.to_string(),
            theme: ThemeMode::default(),
        }
    }
}
