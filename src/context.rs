//! Application context built once at startup and passed explicitly to the
//! chat session and the settings surfaces.

use crate::commands::CommandTable;
use crate::conversation::{Conversation, Submission};
use crate::preferences::PreferenceStore;
use crate::storage::{FileStore, KeyValueStore};
use crate::theme::{AppliedTheme, system_theme};
use crate::types::ImageAttachment;
use std::path::Path;
use std::sync::Arc;

pub struct AppContext {
    pub store: Arc<dyn KeyValueStore>,
    pub preferences: PreferenceStore,
    pub commands: CommandTable,
}

impl AppContext {
    /// Read every persisted domain from `store` once.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let preferences = PreferenceStore::load(store.clone());
        let commands = CommandTable::load(store.clone());
        tracing::debug!(
            commands = commands.commands().len(),
            theme = preferences.display().theme.as_str(),
            "application context loaded"
        );
        Self {
            store,
            preferences,
            commands,
        }
    }

    /// Context backed by a [`FileStore`] in the platform data dir.
    pub fn open_default() -> Self {
        let store = FileStore::open_default();
        tracing::info!(path = %store.root().display(), "using data directory");
        Self::load(Arc::new(store))
    }

    pub fn open_at(dir: &Path) -> Self {
        Self::load(Arc::new(FileStore::new(dir)))
    }

    /// Submit input to `conversation` against the current commands and preferences.
    pub fn submit(
        &self,
        conversation: &mut Conversation,
        input: &str,
        image: Option<ImageAttachment>,
    ) -> Submission {
        conversation.submit(
            input,
            image,
            &self.commands,
            self.preferences.preferences(),
        )
    }

    pub fn applied_theme(&self) -> AppliedTheme {
        self.preferences.applied_theme(system_theme())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{Command, PreferencesUpdate, ThemeMode};

    #[test]
    fn context_reads_every_domain_from_one_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        {
            let mut ctx = AppContext::load(store.clone());
            ctx.commands
                .add(Command::new("Hi", "Greets", "/hi", "Hello!"))
                .unwrap();
            ctx.preferences
                .update_preferences(PreferencesUpdate {
                    name: Some("Ana".into()),
                    ..Default::default()
                })
                .unwrap();
            ctx.preferences.set_theme(ThemeMode::Dark).unwrap();
        }

        let ctx = AppContext::load(store);
        assert!(ctx.commands.get("/hi").is_some());
        assert_eq!(ctx.preferences.preferences().name, "Ana");
        assert_eq!(ctx.applied_theme(), AppliedTheme::Dark);
    }

    #[test]
    fn submit_uses_current_preferences() {
        let mut ctx = AppContext::load(Arc::new(MemoryStore::new()));
        ctx.preferences
            .update_preferences(PreferencesUpdate {
                preferred_response_style: Some("playful".into()),
                ..Default::default()
            })
            .unwrap();

        let mut conversation = Conversation::new();
        let Submission::Send(request) = ctx.submit(&mut conversation, "hello", None) else {
            panic!("expected a send");
        };
        assert_eq!(
            request.preferences.unwrap().preferred_response_style,
            "playful"
        );
    }
}
