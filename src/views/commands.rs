use crate::commands::builtin_commands;
use crate::context::AppContext;
use crate::types::Command;
use dioxus::prelude::*;

#[component]
pub fn CommandsView(ctx: Signal<AppContext>) -> Element {
    let mut ctx = ctx;
    let mut name = use_signal(String::new);
    let mut description = use_signal(String::new);
    let mut trigger = use_signal(String::new);
    let mut response = use_signal(String::new);
    // trigger of the command being edited; `None` while adding
    let mut editing = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);

    let mut reset_form = move || {
        name.set(String::new());
        description.set(String::new());
        trigger.set(String::new());
        response.set(String::new());
        editing.set(None);
    };

    let save = move |_| {
        let command = Command::new(
            name().trim(),
            description().trim(),
            trigger().trim(),
            response(),
        );
        let result = match editing() {
            Some(original) => ctx.write().commands.update(&original, command),
            None => ctx.write().commands.add(command),
        };
        match result {
            Ok(()) => {
                error.set(None);
                reset_form();
            }
            Err(err) => error.set(Some(err.to_string())),
        }
    };

    let custom: Vec<Command> = ctx.read().commands.custom_commands().cloned().collect();
    let is_editing = editing().is_some();

    rsx! {
        div { class: "main-container",
            div { class: "settings-section",
                h3 { class: "section-title", "Built-in commands" }
                for command in builtin_commands() {
                    div { key: "{command.trigger}", class: "command-row",
                        span { "{command.trigger} - {command.description}" }
                    }
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "Your commands" }
                if custom.is_empty() {
                    p { class: "text-muted", "No custom commands yet." }
                }
                for command in custom {
                    CommandRow {
                        key: "{command.trigger}",
                        command: command.clone(),
                        on_edit: move |command: Command| {
                            name.set(command.name);
                            description.set(command.description);
                            response.set(command.response);
                            trigger.set(command.trigger.clone());
                            editing.set(Some(command.trigger));
                            error.set(None);
                        },
                        on_remove: move |removed: String| {
                            match ctx.write().commands.remove(&removed) {
                                Ok(()) => {
                                    if editing().as_deref() == Some(removed.as_str()) {
                                        reset_form();
                                    }
                                }
                                Err(err) => error.set(Some(err.to_string())),
                            }
                        },
                    }
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title",
                    if is_editing { "Edit command" } else { "Add command" }
                }
                input {
                    r#type: "text", placeholder: "Name", value: "{name}",
                    oninput: move |ev| name.set(ev.value()),
                }
                input {
                    r#type: "text", placeholder: "Description", value: "{description}",
                    oninput: move |ev| description.set(ev.value()),
                }
                input {
                    r#type: "text", placeholder: "/trigger", value: "{trigger}",
                    oninput: move |ev| trigger.set(ev.value()),
                }
                textarea {
                    rows: "3", placeholder: "Response", value: "{response}",
                    oninput: move |ev| response.set(ev.value()),
                }
                if let Some(message) = error() {
                    p { class: "error-text", "{message}" }
                }
                div { class: "hstack",
                    button { class: "btn btn-primary", r#type: "button", onclick: save,
                        if is_editing { "Save Changes" } else { "Add Command" }
                    }
                    if is_editing {
                        button {
                            class: "btn", r#type: "button",
                            onclick: move |_| {
                                error.set(None);
                                reset_form();
                            },
                            "Cancel"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn CommandRow(
    command: Command,
    on_edit: EventHandler<Command>,
    on_remove: EventHandler<String>,
) -> Element {
    let edited = command.clone();
    let removed = command.trigger.clone();
    rsx! {
        div { class: "command-row",
            div {
                strong { "{command.trigger}" }
                " {command.name}"
                if !command.description.is_empty() {
                    span { class: "text-muted", " - {command.description}" }
                }
            }
            div { class: "hstack",
                button {
                    class: "btn", r#type: "button",
                    onclick: move |_| on_edit.call(edited.clone()),
                    "Edit"
                }
                button {
                    class: "btn", r#type: "button",
                    onclick: move |_| on_remove.call(removed.clone()),
                    "Remove"
                }
            }
        }
    }
}
