//! Persistence round trips against a file-backed store

use gemchat::context::AppContext;
use gemchat::preferences::AI_AVATAR_GALLERY;
use gemchat::storage::{FileStore, KEY_COMMANDS, KEY_PREFERENCES, KeyValueStore};
use gemchat::theme::{AppliedTheme, SystemTheme};
use gemchat::types::{Command, PreferencesUpdate, ThemeMode, UserPreferences};

fn ana() -> PreferencesUpdate {
    PreferencesUpdate {
        name: Some("Ana".into()),
        interests: Some(vec!["ai".into(), "music".into()]),
        preferred_response_style: Some("concise".into()),
    }
}

#[test]
fn test_everything_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut ctx = AppContext::open_at(dir.path());
        ctx.commands
            .add(Command::new("Joke", "Tell a joke", "/joke", "Knock knock."))
            .unwrap();
        ctx.preferences.update_preferences(ana()).unwrap();
        ctx.preferences.set_ai_avatar(AI_AVATAR_GALLERY[4]).unwrap();
        ctx.preferences.set_theme(ThemeMode::System).unwrap();
    }

    let ctx = AppContext::open_at(dir.path());
    assert_eq!(
        ctx.preferences.preferences(),
        &UserPreferences {
            name: "Ana".into(),
            interests: vec!["ai".into(), "music".into()],
            preferred_response_style: "concise".into(),
        }
    );
    assert_eq!(ctx.commands.get("/joke").unwrap().response, "Knock knock.");
    assert_eq!(ctx.preferences.display().ai_avatar, "/avatars/ai-5.png");
    assert_eq!(
        ctx.preferences.applied_theme(SystemTheme::Dark),
        AppliedTheme::Dark
    );
}

#[test]
fn test_keys_are_stored_one_file_each() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = AppContext::open_at(dir.path());
    ctx.preferences.update_preferences(ana()).unwrap();
    ctx.preferences.set_theme(ThemeMode::Dark).unwrap();

    assert!(dir.path().join("userPreferences.json").exists());
    assert!(dir.path().join("theme.json").exists());
    let store = FileStore::new(dir.path());
    assert_eq!(store.get("theme").as_deref(), Some("dark"));
}

#[test]
fn test_corrupt_commands_leave_preferences_intact() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.set(KEY_COMMANDS, "{{ definitely not json").unwrap();
    store
        .set(KEY_PREFERENCES, r#"{"name":"Ana","interests":["ai"]}"#)
        .unwrap();

    let ctx = AppContext::open_at(dir.path());
    let triggers: Vec<_> = ctx
        .commands
        .commands()
        .iter()
        .map(|cmd| cmd.trigger.as_str())
        .collect();
    assert_eq!(triggers, vec!["/help", "/clear"]);
    assert_eq!(ctx.preferences.preferences().name, "Ana");
    assert_eq!(
        ctx.preferences.preferences().preferred_response_style,
        "helpful and concise"
    );
}

#[test]
fn test_corrupt_preferences_leave_commands_intact() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut ctx = AppContext::open_at(dir.path());
        ctx.commands
            .add(Command::new("Hi", "", "/hi", "Hello!"))
            .unwrap();
    }
    FileStore::new(dir.path())
        .set(KEY_PREFERENCES, "not json")
        .unwrap();

    let ctx = AppContext::open_at(dir.path());
    assert_eq!(ctx.preferences.preferences(), &UserPreferences::default());
    assert!(ctx.commands.get("/hi").is_some());
}
