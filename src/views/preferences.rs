use crate::context::AppContext;
use crate::preferences::parse_interests;
use crate::types::PreferencesUpdate;
use dioxus::prelude::*;

#[component]
pub fn PreferencesView(ctx: Signal<AppContext>) -> Element {
    let mut ctx = ctx;
    let mut name = use_signal(|| ctx.peek().preferences.preferences().name.clone());
    let mut interests = use_signal(|| ctx.peek().preferences.preferences().interests.join(", "));
    let mut style = use_signal(|| {
        ctx.peek()
            .preferences
            .preferences()
            .preferred_response_style
            .clone()
    });
    let mut status = use_signal(|| Option::<Result<(), String>>::None);

    let save = move |_| {
        let update = PreferencesUpdate {
            name: Some(name().trim().to_string()),
            interests: Some(parse_interests(&interests())),
            preferred_response_style: Some(style().trim().to_string()),
        };
        match ctx.write().preferences.update_preferences(update) {
            Ok(()) => status.set(Some(Ok(()))),
            Err(err) => {
                tracing::warn!(error = %err, "failed to save preferences");
                status.set(Some(Err(err.to_string())));
            }
        }
    };

    rsx! {
        div { class: "main-container",
            div { class: "settings-section",
                h3 { class: "section-title", "Name" }
                input {
                    r#type: "text", value: "{name}",
                    oninput: move |ev| name.set(ev.value()),
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "Interests" }
                input {
                    r#type: "text", placeholder: "Comma-separated, e.g. ai, music",
                    value: "{interests}",
                    oninput: move |ev| interests.set(ev.value()),
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "Response style" }
                input {
                    r#type: "text", placeholder: "helpful and concise",
                    value: "{style}",
                    oninput: move |ev| style.set(ev.value()),
                }
            }
            button { class: "btn btn-primary", r#type: "button", onclick: save, "Save Preferences" }
            {match status() {
                Some(Ok(())) => rsx! { p { class: "text-muted", "Preferences saved" } },
                Some(Err(message)) => rsx! { p { class: "error-text", "{message}" } },
                None => rsx! {},
            }}
        }
    }
}
