//! Conversation state machine.
//!
//! A turn moves `Idle -> Sending -> Streaming -> Idle`. Streamed fragments are
//! folded into a single assistant message, and every change is recorded in an
//! event log that renderers read with [`Conversation::events_since`]. Updates
//! carry only the new fragment, and clearing the conversation drops the log
//! recorded so far.

use crate::ai::ChatResult;
use crate::client::ChatTransport;
use crate::commands::{CLEAR_TRIGGER, CommandTable};
use crate::request::ChatRequest;
use crate::types::{ChatMessage, ImageAttachment, UserPreferences};
use futures::StreamExt;
use std::sync::Arc;

pub const FALLBACK_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";
pub const COMMAND_PROCESSED: &str = "Command processed";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Sending,
    Streaming,
}

/// What `submit` decided to do with the input.
#[derive(Debug, PartialEq)]
pub enum Submission {
    Ignored,
    Cleared,
    Command,
    Send(ChatRequest),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConversationEvent {
    MessageAppended(ChatMessage),
    /// `fragment` was appended to the content of message `id`.
    MessageUpdated { id: String, fragment: String },
    PhaseChanged(Phase),
    Cleared,
}

/// One step of a streamed turn, in the order [`drive_turn`] reports them.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnStep {
    Streaming,
    Fragment(String),
    Finished,
    Failed,
}

/// Send `request` over `transport` and report each step of the reply to
/// `on_step`. Every call ends with exactly one `Finished` or `Failed`.
pub async fn drive_turn(
    transport: &dyn ChatTransport,
    request: &ChatRequest,
    mut on_step: impl FnMut(TurnStep),
) -> ChatResult<()> {
    let mut fragments = match transport.send(request).await {
        Ok(fragments) => fragments,
        Err(err) => {
            tracing::error!(error = %err, "chat request failed");
            on_step(TurnStep::Failed);
            return Err(err);
        }
    };

    on_step(TurnStep::Streaming);
    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) => on_step(TurnStep::Fragment(fragment)),
            Err(err) => {
                tracing::error!(error = %err, "chat stream failed");
                on_step(TurnStep::Failed);
                return Err(err);
            }
        }
    }
    on_step(TurnStep::Finished);
    Ok(())
}

#[derive(Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    phase: Phase,
    turn_buffer: String,
    // index of this turn's assistant message, once the first fragment lands
    reply: Option<usize>,
    events: Vec<ConversationEvent>,
    // cursor value of `events[0]`; grows when `clear` drops the log
    base: usize,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Position to pass to [`Self::events_since`] to read only newer events.
    pub fn cursor(&self) -> usize {
        self.base + self.events.len()
    }

    /// Events recorded after `cursor`. A cursor taken before the last
    /// `clear` reads from the `Cleared` event onwards.
    pub fn events_since(&self, cursor: usize) -> &[ConversationEvent] {
        let start = cursor.saturating_sub(self.base);
        self.events.get(start..).unwrap_or_default()
    }

    /// Route one user input. Commands are answered locally; anything else
    /// becomes a [`ChatRequest`] the caller hands to a transport.
    pub fn submit(
        &mut self,
        input: &str,
        image: Option<ImageAttachment>,
        commands: &CommandTable,
        preferences: &UserPreferences,
    ) -> Submission {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = ?self.phase, "ignoring input while a turn is in flight");
            return Submission::Ignored;
        }
        let trimmed = input.trim();
        if trimmed.is_empty() && image.is_none() {
            return Submission::Ignored;
        }

        if trimmed == CLEAR_TRIGGER {
            self.clear();
            return Submission::Cleared;
        }

        let outcome = commands.process(trimmed);
        if outcome.is_command {
            if image.is_some() {
                tracing::debug!("dropping image attached to command input");
            }
            self.push(ChatMessage::user(input));
            let response = outcome
                .response
                .unwrap_or_else(|| COMMAND_PROCESSED.to_string());
            self.push(ChatMessage::assistant(response));
            return Submission::Command;
        }

        let history = self
            .messages
            .iter()
            .map(ChatMessage::to_history_entry)
            .collect();
        let image = image.map(Arc::new);
        self.push(ChatMessage::user(input).with_image(image.clone()));
        self.turn_buffer.clear();
        self.reply = None;
        self.set_phase(Phase::Sending);

        Submission::Send(ChatRequest {
            message: input.to_string(),
            image,
            history,
            preferences: Some(preferences.clone()),
        })
    }

    pub fn begin_streaming(&mut self) {
        if self.phase == Phase::Sending {
            self.set_phase(Phase::Streaming);
        }
    }

    /// Fold one fragment into this turn's assistant message, creating it on
    /// the first non-empty fragment.
    pub fn apply_fragment(&mut self, fragment: &str) {
        if self.phase != Phase::Streaming {
            tracing::debug!(phase = ?self.phase, "dropping fragment outside a stream");
            return;
        }
        if fragment.is_empty() {
            return;
        }
        self.turn_buffer.push_str(fragment);

        match self.reply.and_then(|index| self.messages.get_mut(index)) {
            Some(message) => {
                message.content.push_str(fragment);
                self.events.push(ConversationEvent::MessageUpdated {
                    id: message.id.clone(),
                    fragment: fragment.to_string(),
                });
            }
            None => {
                self.reply = Some(self.messages.len());
                self.push(ChatMessage::assistant(self.turn_buffer.clone()));
            }
        }
    }

    pub fn finish(&mut self) {
        self.end_turn();
    }

    /// End the turn after a failure. Partial content stays as it is; a turn
    /// that produced nothing gets the fallback reply.
    pub fn fail(&mut self) {
        if self.phase == Phase::Idle {
            return;
        }
        if self.reply.is_none() {
            self.push(ChatMessage::assistant(FALLBACK_MESSAGE));
        }
        self.end_turn();
    }

    pub fn apply_step(&mut self, step: TurnStep) {
        match step {
            TurnStep::Streaming => self.begin_streaming(),
            TurnStep::Fragment(fragment) => self.apply_fragment(&fragment),
            TurnStep::Finished => self.finish(),
            TurnStep::Failed => self.fail(),
        }
    }

    /// Drive one turn to completion over `transport`. The conversation is
    /// back in `Idle` whichever way this returns; the error is handed back
    /// for logging only.
    pub async fn run_turn(
        &mut self,
        transport: &dyn ChatTransport,
        request: &ChatRequest,
    ) -> ChatResult<()> {
        drive_turn(transport, request, |step| self.apply_step(step)).await
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.turn_buffer.clear();
        self.reply = None;
        self.base += self.events.len();
        self.events.clear();
        self.events.push(ConversationEvent::Cleared);
    }

    fn push(&mut self, message: ChatMessage) {
        self.events
            .push(ConversationEvent::MessageAppended(message.clone()));
        self.messages.push(message);
    }

    fn end_turn(&mut self) {
        self.turn_buffer.clear();
        self.reply = None;
        self.set_phase(Phase::Idle);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.events.push(ConversationEvent::PhaseChanged(phase));
        }
    }
}
