//! Slash-command table and the interceptor that resolves chat input against it.

use crate::storage::{self, KEY_COMMANDS, KeyValueStore, StorageError};
use crate::types::Command;
use once_cell::sync::Lazy;
use std::sync::Arc;

pub const TRIGGER_PREFIX: char = '/';
pub const HELP_TRIGGER: &str = "/help";
pub const CLEAR_TRIGGER: &str = "/clear";

static BUILTIN_COMMANDS: Lazy<Vec<Command>> = Lazy::new(|| {
    vec![
        Command::new(
            "Help",
            "Show available commands",
            HELP_TRIGGER,
            "Available commands:\n/help - Show this help message\n/clear - Clear chat history",
        ),
        Command::new(
            "Clear",
            "Clear chat history",
            CLEAR_TRIGGER,
            "Chat history cleared!",
        ),
    ]
});

pub fn builtin_commands() -> &'static [Command] {
    &BUILTIN_COMMANDS
}

pub fn is_builtin(trigger: &str) -> bool {
    BUILTIN_COMMANDS.iter().any(|cmd| cmd.trigger == trigger)
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("All fields are required")]
    EmptyField,

    #[error("Command trigger must start with /")]
    MissingPrefix,

    #[error("Command trigger already exists")]
    DuplicateTrigger,

    #[error("Built-in command {0} cannot be changed")]
    BuiltIn(String),

    #[error("No command with trigger {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub is_command: bool,
    pub response: Option<String>,
}

impl CommandOutcome {
    fn not_a_command() -> Self {
        Self::default()
    }

    fn respond(text: String) -> Self {
        Self {
            is_command: true,
            response: Some(text),
        }
    }
}

/// Built-ins followed by user commands in creation order.
pub struct CommandTable {
    store: Arc<dyn KeyValueStore>,
    commands: Vec<Command>,
}

impl CommandTable {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut commands = BUILTIN_COMMANDS.clone();
        if let Some(stored) = storage::get_json::<Vec<Command>>(store.as_ref(), KEY_COMMANDS) {
            for cmd in stored {
                if validate(&cmd).is_err() || commands.iter().any(|c| c.trigger == cmd.trigger) {
                    tracing::warn!(trigger = %cmd.trigger, "dropping invalid stored command");
                    continue;
                }
                commands.push(cmd);
            }
        }
        Self { store, commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// User commands only; these are what the editing surface shows.
    pub fn custom_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|cmd| !is_builtin(&cmd.trigger))
    }

    pub fn get(&self, trigger: &str) -> Option<&Command> {
        self.commands.iter().find(|cmd| cmd.trigger == trigger)
    }

    pub fn add(&mut self, command: Command) -> Result<(), CommandError> {
        validate(&command)?;
        if self.get(&command.trigger).is_some() {
            return Err(CommandError::DuplicateTrigger);
        }
        self.commit(|commands| commands.push(command))
    }

    pub fn update(&mut self, trigger: &str, command: Command) -> Result<(), CommandError> {
        if is_builtin(trigger) {
            return Err(CommandError::BuiltIn(trigger.to_string()));
        }
        let index = self
            .commands
            .iter()
            .position(|cmd| cmd.trigger == trigger)
            .ok_or_else(|| CommandError::NotFound(trigger.to_string()))?;
        validate(&command)?;
        if command.trigger != trigger && self.get(&command.trigger).is_some() {
            return Err(CommandError::DuplicateTrigger);
        }
        self.commit(|commands| commands[index] = command)
    }

    pub fn remove(&mut self, trigger: &str) -> Result<(), CommandError> {
        if is_builtin(trigger) {
            return Err(CommandError::BuiltIn(trigger.to_string()));
        }
        if self.get(trigger).is_none() {
            return Err(CommandError::NotFound(trigger.to_string()));
        }
        self.commit(|commands| commands.retain(|cmd| cmd.trigger != trigger))
    }

    /// Resolve chat input against the table.
    pub fn process(&self, input: &str) -> CommandOutcome {
        if !input.starts_with(TRIGGER_PREFIX) {
            return CommandOutcome::not_a_command();
        }
        let trimmed = input.trim();

        if trimmed == HELP_TRIGGER {
            return CommandOutcome::respond(self.help_text());
        }

        match self
            .commands
            .iter()
            .find(|cmd| trimmed.starts_with(cmd.trigger.as_str()))
        {
            Some(cmd) => CommandOutcome::respond(cmd.response.clone()),
            None => CommandOutcome::not_a_command(),
        }
    }

    pub fn help_text(&self) -> String {
        let lines = self
            .commands
            .iter()
            .map(|cmd| format!("{} - {}", cmd.trigger, cmd.description))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Available commands:\n{lines}")
    }

    /// Apply `edit` to a copy, persist the user commands, then swap it in.
    fn commit(&mut self, edit: impl FnOnce(&mut Vec<Command>)) -> Result<(), CommandError> {
        let mut next = self.commands.clone();
        edit(&mut next);
        let custom: Vec<&Command> = next.iter().filter(|cmd| !is_builtin(&cmd.trigger)).collect();
        storage::set_json(self.store.as_ref(), KEY_COMMANDS, &custom)?;
        self.commands = next;
        Ok(())
    }
}

fn validate(command: &Command) -> Result<(), CommandError> {
    if command.name.trim().is_empty()
        || command.trigger.trim().is_empty()
        || command.response.trim().is_empty()
    {
        return Err(CommandError::EmptyField);
    }
    if !command.trigger.starts_with(TRIGGER_PREFIX) {
        return Err(CommandError::MissingPrefix);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn table() -> CommandTable {
        CommandTable::load(Arc::new(MemoryStore::new()))
    }

    fn joke() -> Command {
        Command::new("Joke", "Tell a joke", "/joke", "Why did the crab never share?")
    }

    #[test]
    fn plain_text_is_not_a_command() {
        let table = table();
        for input in ["hello", "", " /help", "what is /help"] {
            assert!(!table.process(input).is_command, "{input:?}");
        }
    }

    #[test]
    fn help_lists_every_command_in_table_order() {
        let mut table = table();
        table.add(joke()).unwrap();
        let outcome = table.process("/help");
        assert!(outcome.is_command);
        assert_eq!(
            outcome.response.as_deref(),
            Some(
                "Available commands:\n/help - Show available commands\n/clear - Clear chat history\n/joke - Tell a joke"
            )
        );
    }

    #[test]
    fn trigger_matches_exactly_and_with_trailing_content() {
        let mut table = table();
        table.add(joke()).unwrap();
        let expected = Some("Why did the crab never share?".to_string());
        assert_eq!(table.process("/joke").response, expected);
        assert_eq!(table.process("/joke about crabs").response, expected);
        assert!(!table.process("/unknown").is_command);
    }

    #[test]
    fn builtins_cannot_be_removed_or_edited() {
        let mut table = table();
        let original = table.get(HELP_TRIGGER).cloned().unwrap();

        assert!(matches!(
            table.remove(HELP_TRIGGER),
            Err(CommandError::BuiltIn(_))
        ));
        assert!(matches!(
            table.update(HELP_TRIGGER, Command::new("Help", "", "/help", "nope")),
            Err(CommandError::BuiltIn(_))
        ));
        assert!(matches!(
            table.remove(CLEAR_TRIGGER),
            Err(CommandError::BuiltIn(_))
        ));
        assert_eq!(table.get(HELP_TRIGGER), Some(&original));
    }

    #[test]
    fn editing_a_custom_command_cannot_take_a_builtin_trigger() {
        let mut table = table();
        table.add(joke()).unwrap();
        let err = table
            .update("/joke", Command::new("Joke", "", "/clear", "x"))
            .unwrap_err();
        assert!(matches!(err, CommandError::DuplicateTrigger));
        assert_eq!(table.get("/clear").unwrap().name, "Clear");
    }

    #[test]
    fn duplicate_trigger_is_rejected_without_mutation() {
        let mut table = table();
        table.add(joke()).unwrap();
        let before = table.commands().to_vec();
        let err = table
            .add(Command::new("Other", "", "/joke", "different"))
            .unwrap_err();
        assert!(matches!(err, CommandError::DuplicateTrigger));
        assert_eq!(table.commands(), before.as_slice());
    }

    #[test]
    fn validation_rejects_missing_fields_and_prefix() {
        let mut table = table();
        assert!(matches!(
            table.add(Command::new("", "", "/x", "y")),
            Err(CommandError::EmptyField)
        ));
        assert!(matches!(
            table.add(Command::new("X", "", "x", "y")),
            Err(CommandError::MissingPrefix)
        ));
        assert_eq!(table.commands().len(), 2);
    }

    #[test]
    fn update_keeps_position_and_remove_drops_entry() {
        let mut table = table();
        table.add(joke()).unwrap();
        table
            .add(Command::new("Hi", "Greets", "/hi", "Hello!"))
            .unwrap();
        table
            .update("/joke", Command::new("Pun", "A pun", "/pun", "Lettuce pray."))
            .unwrap();
        let triggers: Vec<_> = table.custom_commands().map(|c| c.trigger.as_str()).collect();
        assert_eq!(triggers, vec!["/pun", "/hi"]);

        table.remove("/pun").unwrap();
        assert!(table.get("/pun").is_none());
        assert!(matches!(
            table.remove("/pun"),
            Err(CommandError::NotFound(_))
        ));
    }

    #[test]
    fn only_custom_commands_are_persisted_and_reloaded() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut table = CommandTable::load(store.clone());
        table.add(joke()).unwrap();

        let raw = store.get(KEY_COMMANDS).unwrap();
        assert!(!raw.contains("/help"));

        let reloaded = CommandTable::load(store);
        let triggers: Vec<_> = reloaded
            .commands()
            .iter()
            .map(|c| c.trigger.as_str())
            .collect();
        assert_eq!(triggers, vec!["/help", "/clear", "/joke"]);
    }

    #[test]
    fn stored_entries_shadowing_builtins_are_dropped() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set(
                KEY_COMMANDS,
                r#"[{"name":"Evil","description":"","trigger":"/help","response":"pwned"}]"#,
            )
            .unwrap();
        let table = CommandTable::load(store);
        assert_eq!(table.commands().len(), 2);
        assert_eq!(table.get("/help").unwrap().name, "Help");
    }

    #[test]
    fn corrupt_stored_commands_fall_back_to_builtins() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(KEY_COMMANDS, "not json").unwrap();
        let table = CommandTable::load(store);
        assert_eq!(table.commands(), builtin_commands());
    }
}
