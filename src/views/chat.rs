use crate::client::HttpTransport;
use crate::context::AppContext;
use crate::conversation::{Conversation, ConversationEvent, Phase, Submission, drive_turn};
use crate::preferences::avatar_data_url;
use crate::request::ChatRequest;
use crate::types::{ChatMessage, ImageAttachment, Role};
use crate::views::read_image;
use dioxus::events::Key;
use dioxus::prelude::*;
use std::sync::Arc;

const SCROLL_TO_BOTTOM: &str = r#"
const list = document.getElementById("chat-list");
if (list) { list.scrollTop = list.scrollHeight; }
"#;

fn role_class(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Drive one turn, writing every step into the conversation signal so the
/// view re-renders as fragments land.
async fn run_turn(
    mut conversation: Signal<Conversation>,
    transport: Option<Arc<HttpTransport>>,
    request: ChatRequest,
) {
    let Some(transport) = transport else {
        tracing::error!("no chat endpoint configured");
        conversation.write().fail();
        return;
    };
    // failures are logged by the driver and already folded into the conversation
    let _ = drive_turn(transport.as_ref(), &request, move |step| {
        conversation.write().apply_step(step)
    })
    .await;
}

#[component]
pub fn ChatView(
    ctx: Signal<AppContext>,
    conversation: Signal<Conversation>,
    transport: Signal<Option<Arc<HttpTransport>>>,
) -> Element {
    let mut conversation = conversation;
    let mut input = use_signal(String::new);
    let mut image_path = use_signal(String::new);
    let mut attachment = use_signal(|| Option::<ImageAttachment>::None);
    let mut attach_error = use_signal(|| Option::<String>::None);
    let mut seen = use_signal(|| 0usize);

    use_effect(move || {
        let (changed, cursor) = {
            let conv = conversation.read();
            let changed = conv.events_since(*seen.peek()).iter().any(|event| {
                !matches!(event, ConversationEvent::PhaseChanged(_))
            });
            (changed, conv.cursor())
        };
        seen.set(cursor);
        if changed {
            let _ = document::eval(SCROLL_TO_BOTTOM);
        }
    });

    let mut send_message = move |text: String| {
        if conversation.read().is_busy() {
            return;
        }
        let image = attachment.write().take();
        let submission = ctx.read().submit(&mut conversation.write(), &text, image);
        match submission {
            Submission::Ignored => {}
            Submission::Send(request) => {
                input.set(String::new());
                image_path.set(String::new());
                spawn(run_turn(conversation, transport(), request));
            }
            Submission::Command | Submission::Cleared => {
                input.set(String::new());
                image_path.set(String::new());
            }
        }
    };

    let display = ctx.read().preferences.display().clone();
    let messages = conversation.read().messages().to_vec();
    let phase = conversation.read().phase();
    let busy = phase != Phase::Idle;
    let attached_name = attachment.read().as_ref().map(|image| {
        image
            .file_name
            .clone()
            .unwrap_or_else(|| "image".to_string())
    });
    let can_send = !busy && (!input().trim().is_empty() || attached_name.is_some());

    rsx! {
        div { class: "main-container",
            div { class: "hstack", style: "justify-content: flex-end;",
                button {
                    class: "btn", r#type: "button",
                    disabled: busy,
                    onclick: move |_| conversation.write().clear(),
                    "Clear Chat"
                }
            }
            div { id: "chat-list", class: "chat-list",
                for msg in messages.iter() {
                    MessageRow {
                        key: "{msg.id}",
                        message: msg.clone(),
                        avatar: match msg.role {
                            Role::User => display.user_avatar.clone(),
                            Role::Assistant => display.ai_avatar.clone(),
                        },
                    }
                }
                if phase == Phase::Sending {
                    div { class: "message-row assistant",
                        img { class: "avatar", src: "{display.ai_avatar}", alt: "assistant avatar" }
                        div { class: "bubble assistant",
                            span { class: "shimmer-text", "Thinking…" }
                        }
                    }
                }
            }

            form { class: "composer", onsubmit: move |ev| ev.prevent_default(),
                div { class: "hstack",
                    input {
                        r#type: "text", placeholder: "Image path (optional)",
                        value: "{image_path}",
                        oninput: move |ev| image_path.set(ev.value()),
                        disabled: busy,
                    }
                    button {
                        class: "btn", r#type: "button",
                        disabled: busy || image_path().trim().is_empty(),
                        onclick: move |_| match read_image(&image_path()) {
                            Ok(image) => {
                                attachment.set(Some(image));
                                attach_error.set(None);
                            }
                            Err(err) => attach_error.set(Some(err)),
                        },
                        "Attach"
                    }
                    if let Some(name) = attached_name {
                        span { class: "text-muted", "{name}" }
                        button {
                            class: "btn", r#type: "button",
                            onclick: move |_| attachment.set(None),
                            "Remove"
                        }
                    }
                }
                if let Some(err) = attach_error() {
                    p { class: "error-text", "{err}" }
                }
                div { class: "hstack",
                    textarea {
                        rows: "2", placeholder: "Type a message or /help",
                        value: "{input}", oninput: move |ev| input.set(ev.value()),
                        onkeydown: move |ev| {
                            if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                ev.prevent_default();
                                send_message(input());
                            }
                        },
                        disabled: busy, autofocus: true,
                    }
                    button {
                        class: "btn btn-primary", r#type: "button",
                        disabled: !can_send,
                        onclick: move |_| send_message(input()),
                        "Send"
                    }
                }
            }
        }
    }
}

#[component]
fn MessageRow(message: ChatMessage, avatar: String) -> Element {
    let class = role_class(message.role);
    let bubble = if message.is_command() {
        format!("bubble {class} command")
    } else {
        format!("bubble {class}")
    };
    let image_src = message
        .image
        .as_ref()
        .map(|image| avatar_data_url(&image.mime_type, &image.data));

    rsx! {
        div { class: "message-row {class}",
            img { class: "avatar", src: "{avatar}", alt: "{class} avatar" }
            div { class: "{bubble}",
                "{message.content}"
                if let Some(src) = image_src {
                    img { src: "{src}", alt: "attached image" }
                }
            }
        }
    }
}
