//! Boundary request and its translation into provider content parts.
//!
//! Nothing here performs I/O: the builder is a pure transformation from chat
//! state and preferences into what the provider receives.

use crate::types::{
    DEFAULT_RESPONSE_STYLE, DEFAULT_USER_NAME, HistoryEntry, ImageAttachment, PreferencesUpdate,
    Role, UserPreferences,
};
use std::sync::Arc;

pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_IMAGE: &str = "image";
pub const FIELD_HISTORY: &str = "history";
pub const FIELD_PREFERENCES: &str = "userPreferences";

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("a message or an image is required")]
    Empty,

    #[error("invalid {field} field: {source}")]
    InvalidJson {
        field: &'static str,
        source: serde_json::Error,
    },
}

/// What the client sends to the boundary service for one turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub image: Option<Arc<ImageAttachment>>,
    pub history: Vec<HistoryEntry>,
    pub preferences: Option<UserPreferences>,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.message.trim().is_empty() && self.image.is_none() {
            return Err(RequestError::Empty);
        }
        Ok(())
    }

    /// Rebuild a request from raw multipart fields.
    pub fn from_fields(
        message: Option<String>,
        image: Option<ImageAttachment>,
        history: Option<&str>,
        preferences: Option<&str>,
    ) -> Result<Self, RequestError> {
        let history = match history.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => serde_json::from_str(raw).map_err(|source| RequestError::InvalidJson {
                field: FIELD_HISTORY,
                source,
            })?,
            None => Vec::new(),
        };
        let preferences = match preferences.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some("null") | None => None,
            Some(raw) => {
                let update: PreferencesUpdate =
                    serde_json::from_str(raw).map_err(|source| RequestError::InvalidJson {
                        field: FIELD_PREFERENCES,
                        source,
                    })?;
                let mut prefs = UserPreferences::default();
                update.apply_to(&mut prefs);
                Some(prefs)
            }
        };
        let request = Self {
            message: message.unwrap_or_default(),
            image: image.map(Arc::new),
            history,
            preferences,
        };
        request.validate()?;
        Ok(request)
    }

    /// Encode as the multipart form the boundary service accepts.
    pub fn to_form(&self) -> Result<reqwest::multipart::Form, reqwest::Error> {
        use reqwest::multipart::{Form, Part};

        let history = serde_json::to_string(&self.history).unwrap_or_else(|_| "[]".to_string());
        let mut form = Form::new()
            .text(FIELD_MESSAGE, self.message.clone())
            .text(FIELD_HISTORY, history);

        if let Some(prefs) = &self.preferences
            && let Ok(raw) = serde_json::to_string(prefs)
        {
            form = form.text(FIELD_PREFERENCES, raw);
        }

        if let Some(image) = &self.image {
            let part = Part::bytes(image.data.clone())
                .file_name(image.file_name.clone().unwrap_or_else(|| "image".to_string()))
                .mime_str(&image.mime_type)?;
            form = form.part(FIELD_IMAGE, part);
        }
        Ok(form)
    }

    pub fn into_provider_request(self) -> ProviderRequest {
        let parts = build_parts(
            &self.message,
            self.image.as_deref(),
            self.preferences.as_ref(),
        );
        ProviderRequest {
            history: map_history(&self.history),
            parts,
        }
    }
}

// ============================================
// Provider-side shapes
// ============================================

/// The provider's two-party role vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderRole {
    User,
    Model,
}

impl ProviderRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderRole::User => "user",
            ProviderRole::Model => "model",
        }
    }
}

impl From<Role> for ProviderRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ProviderRole::User,
            Role::Assistant => ProviderRole::Model,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderTurn {
    pub role: ProviderRole,
    pub parts: Vec<ContentPart>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderRequest {
    pub history: Vec<ProviderTurn>,
    pub parts: Vec<ContentPart>,
}

pub fn render_preamble(prefs: &UserPreferences) -> String {
    let name = if prefs.name.is_empty() {
        DEFAULT_USER_NAME
    } else {
        prefs.name.as_str()
    };
    let interests = if prefs.interests.is_empty() {
        "various topics".to_string()
    } else {
        prefs.interests.join(", ")
    };
    let style = if prefs.preferred_response_style.is_empty() {
        DEFAULT_RESPONSE_STYLE
    } else {
        prefs.preferred_response_style.as_str()
    };

    format!(
        "Context for this conversation:\n\
         - My name is {name}\n\
         - I'm interested in: {interests}\n\
         - Please respond in a {style} manner\n\
         \n\
         My message is: "
    )
}

/// Preamble (if preferences are present), then text (if non-blank), then image.
pub fn build_parts(
    message: &str,
    image: Option<&ImageAttachment>,
    prefs: Option<&UserPreferences>,
) -> Vec<ContentPart> {
    let mut parts = Vec::with_capacity(3);
    if let Some(prefs) = prefs {
        parts.push(ContentPart::Text(render_preamble(prefs)));
    }
    if !message.trim().is_empty() {
        parts.push(ContentPart::Text(message.to_string()));
    }
    if let Some(image) = image {
        parts.push(ContentPart::InlineImage {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        });
    }
    parts
}

pub fn map_history(history: &[HistoryEntry]) -> Vec<ProviderTurn> {
    history
        .iter()
        .map(|entry| ProviderTurn {
            role: entry.role.into(),
            parts: vec![ContentPart::Text(entry.content.clone())],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> UserPreferences {
        UserPreferences {
            name: "Ana".into(),
            interests: vec!["ai".into(), "music".into()],
            preferred_response_style: "concise".into(),
        }
    }

    #[test]
    fn preamble_uses_preferences() {
        assert_eq!(
            render_preamble(&ana()),
            "Context for this conversation:\n- My name is Ana\n- I'm interested in: ai, music\n- Please respond in a concise manner\n\nMy message is: "
        );
    }

    #[test]
    fn preamble_falls_back_for_blank_fields() {
        let prefs = UserPreferences {
            name: String::new(),
            interests: Vec::new(),
            preferred_response_style: String::new(),
        };
        let text = render_preamble(&prefs);
        assert!(text.contains("My name is User"));
        assert!(text.contains("interested in: various topics"));
        assert!(text.contains("in a helpful and concise manner"));
    }

    #[test]
    fn parts_are_ordered_preamble_text_image() {
        let image = ImageAttachment::new("image/png", vec![1, 2, 3]);
        let parts = build_parts("what is this?", Some(&image), Some(&ana()));
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], ContentPart::Text(t) if t.starts_with("Context")));
        assert_eq!(parts[1], ContentPart::Text("what is this?".into()));
        assert_eq!(
            parts[2],
            ContentPart::InlineImage {
                mime_type: "image/png".into(),
                data: vec![1, 2, 3]
            }
        );
    }

    #[test]
    fn blank_text_is_omitted() {
        let image = ImageAttachment::new("image/jpeg", vec![9]);
        let parts = build_parts("   ", Some(&image), None);
        assert_eq!(parts.len(), 1);
        assert!(matches!(parts[0], ContentPart::InlineImage { .. }));
    }

    #[test]
    fn history_roles_map_to_provider_vocabulary() {
        let turns = map_history(&[
            HistoryEntry {
                role: Role::User,
                content: "hi".into(),
            },
            HistoryEntry {
                role: Role::Assistant,
                content: "hello".into(),
            },
        ]);
        assert_eq!(turns[0].role, ProviderRole::User);
        assert_eq!(turns[1].role, ProviderRole::Model);
        assert_eq!(turns[1].parts, vec![ContentPart::Text("hello".into())]);
    }

    #[test]
    fn from_fields_requires_message_or_image() {
        let err = ChatRequest::from_fields(Some("  ".into()), None, None, None).unwrap_err();
        assert!(matches!(err, RequestError::Empty));

        let ok = ChatRequest::from_fields(
            None,
            Some(ImageAttachment::new("image/png", vec![0])),
            Some("[]"),
            None,
        )
        .unwrap();
        assert!(ok.image.is_some());
    }

    #[test]
    fn from_fields_rejects_malformed_history() {
        let err =
            ChatRequest::from_fields(Some("hi".into()), None, Some("{oops"), None).unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidJson {
                field: FIELD_HISTORY,
                ..
            }
        ));
    }

    #[test]
    fn from_fields_parses_history_and_preferences() {
        let request = ChatRequest::from_fields(
            Some("next".into()),
            None,
            Some(r#"[{"role":"user","content":"a"},{"role":"assistant","content":"b"}]"#),
            Some(r#"{"name":"Ana","interests":["ai"],"preferredResponseStyle":"concise"}"#),
        )
        .unwrap();
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.preferences.unwrap().name, "Ana");
    }
}
