use crate::types::ThemeMode;

/// What the host platform currently prefers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SystemTheme {
    Dark,
    #[default]
    Light,
}

/// The concrete theme a renderer applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppliedTheme {
    Dark,
    Light,
}

impl AppliedTheme {
    pub fn class_name(self) -> &'static str {
        match self {
            AppliedTheme::Dark => "dark",
            AppliedTheme::Light => "light",
        }
    }
}

pub fn resolve_theme(mode: ThemeMode, system: SystemTheme) -> AppliedTheme {
    match mode {
        ThemeMode::Dark => AppliedTheme::Dark,
        ThemeMode::Light => AppliedTheme::Light,
        ThemeMode::System => match system {
            SystemTheme::Dark => AppliedTheme::Dark,
            SystemTheme::Light => AppliedTheme::Light,
        },
    }
}

/// System preference from `GEMCHAT_SYSTEM_THEME`; light when unset.
pub fn system_theme() -> SystemTheme {
    match std::env::var("GEMCHAT_SYSTEM_THEME")
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "dark" => SystemTheme::Dark,
        _ => SystemTheme::Light,
    }
}

pub struct ThemeDefinition {
    pub css: &'static str,
    pub root_class: &'static str,
}

pub fn theme_definition(theme: AppliedTheme) -> ThemeDefinition {
    match theme {
        AppliedTheme::Dark => ThemeDefinition {
            css: DARK_THEME,
            root_class: "dark",
        },
        AppliedTheme::Light => ThemeDefinition {
            css: LIGHT_THEME,
            root_class: "light",
        },
    }
}

/// Layout rules shared by both themes; colours come from the theme sheet.
pub const BASE_CSS: &str = r#"
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, sans-serif; }
.header { display: flex; align-items: center; justify-content: space-between; padding: 0.75rem 1rem; border-bottom: 1px solid var(--color-border); }
.tabs { display: flex; gap: 1rem; }
.tab { font-size: 1rem; margin: 0; cursor: pointer; color: var(--color-text-muted); }
.tab.active { color: var(--color-text-primary); }
.tab-panel { display: none; }
.tab-panel.active { display: block; }
.main-container { display: flex; flex-direction: column; height: calc(100vh - 3.5rem); padding: 1rem; gap: 0.75rem; }
.chat-list { flex: 1; overflow-y: auto; padding: 1rem; border-radius: 0.5rem; }
.message-row { display: flex; gap: 0.5rem; margin-bottom: 0.75rem; align-items: flex-start; }
.message-row.user { flex-direction: row-reverse; }
.avatar { width: 2rem; height: 2rem; border-radius: 50%; object-fit: cover; }
.bubble { max-width: 70%; padding: 0.5rem 0.75rem; border-radius: 0.75rem; white-space: pre-wrap; }
.bubble.user { background: var(--color-chat-user-bg); color: var(--color-chat-user-text); }
.bubble.assistant { background: var(--color-chat-assistant-bg); color: var(--color-chat-assistant-text); border: 1px solid var(--color-border); }
.bubble.command { background: var(--color-chat-command-bg); color: var(--color-text-primary); font-family: monospace; }
.bubble img { display: block; max-width: 16rem; margin-top: 0.5rem; border-radius: 0.5rem; }
.shimmer-text { color: var(--color-text-muted); font-style: italic; }
.composer { display: flex; flex-direction: column; gap: 0.5rem; }
.hstack { display: flex; gap: 0.5rem; align-items: flex-end; }
.composer textarea { flex: 1; resize: none; padding: 0.5rem; border: 1px solid; border-radius: 0.5rem; }
.settings-section { margin-bottom: 1.5rem; }
.settings-section input, .settings-section textarea { padding: 0.4rem; border: 1px solid; border-radius: 0.4rem; width: 100%; }
.gallery { display: flex; gap: 0.5rem; flex-wrap: wrap; }
.gallery img { width: 3rem; height: 3rem; border-radius: 50%; cursor: pointer; border: 2px solid transparent; }
.gallery img.active { border-color: var(--color-chat-user-bg); }
.theme-option.active, .btn-primary { background: var(--color-chat-user-bg); color: var(--color-chat-user-text); }
.command-row { display: flex; justify-content: space-between; align-items: center; padding: 0.4rem 0; border-bottom: 1px solid var(--color-border); }
.text-muted { color: var(--color-text-muted); }
.error-text { color: var(--color-error); }
"#;

const DARK_THEME: &str = r#"
:root {
    --color-bg-primary: #030712;
    --color-bg-secondary: #111827;
    --color-text-primary: #f9fafb;
    --color-text-muted: #9ca3af;
    --color-border: #374151;
    --color-input-bg: #111827;
    --color-chat-user-bg: #3b82f6;
    --color-chat-user-text: #ffffff;
    --color-chat-command-bg: #374151;
    --color-chat-assistant-bg: #1f2937;
    --color-chat-assistant-text: #f9fafb;
    --color-error: #f87171;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.chat-list { background: var(--color-bg-secondary); }
.composer textarea, .settings-section input { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-border); }
"#;

const LIGHT_THEME: &str = r#"
:root {
    --color-bg-primary: #ffffff;
    --color-bg-secondary: #f9fafb;
    --color-text-primary: #111827;
    --color-text-muted: #6b7280;
    --color-border: #e5e7eb;
    --color-input-bg: #ffffff;
    --color-chat-user-bg: #3b82f6;
    --color-chat-user-text: #ffffff;
    --color-chat-command-bg: #e5e7eb;
    --color-chat-assistant-bg: #ffffff;
    --color-chat-assistant-text: #111827;
    --color-error: #dc2626;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.chat-list { background: var(--color-bg-secondary); }
.composer textarea, .settings-section input { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-border); }
"#;
