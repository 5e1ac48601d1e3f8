use crate::context::AppContext;
use crate::preferences::{AI_AVATAR_GALLERY, AvatarSlot, avatar_data_url};
use crate::storage::StorageResult;
use crate::types::ThemeMode;
use crate::views::read_image;
use dioxus::prelude::*;

fn report(mut status: Signal<Option<String>>, result: StorageResult<()>) {
    match result {
        Ok(()) => status.set(None),
        Err(err) => {
            tracing::warn!(error = %err, "failed to save display settings");
            status.set(Some(err.to_string()));
        }
    }
}

#[component]
pub fn SettingsView(ctx: Signal<AppContext>) -> Element {
    let mut ctx = ctx;
    let mut avatar_path = use_signal(String::new);
    let mut status = use_signal(|| Option::<String>::None);

    let display = ctx.read().preferences.display().clone();

    let upload_avatar = move |_| match read_image(&avatar_path()) {
        Ok(image) => {
            let url = avatar_data_url(&image.mime_type, &image.data);
            report(status, ctx.write().preferences.set_user_avatar(url));
            avatar_path.set(String::new());
        }
        Err(err) => status.set(Some(err)),
    };

    rsx! {
        div { class: "main-container",
            div { class: "settings-section",
                h3 { class: "section-title", "Your avatar" }
                div { class: "hstack",
                    img { class: "avatar", src: "{display.user_avatar}", alt: "user avatar" }
                    input {
                        r#type: "text", placeholder: "Path to an image",
                        value: "{avatar_path}",
                        oninput: move |ev| avatar_path.set(ev.value()),
                    }
                    button {
                        class: "btn", r#type: "button",
                        disabled: avatar_path().trim().is_empty(),
                        onclick: upload_avatar,
                        "Upload"
                    }
                    button {
                        class: "btn", r#type: "button",
                        onclick: move |_| report(status, ctx.write().preferences.reset_avatar(AvatarSlot::User)),
                        "Reset"
                    }
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "AI avatar" }
                div { class: "gallery",
                    for src in AI_AVATAR_GALLERY {
                        img {
                            key: "{src}",
                            class: if display.ai_avatar == src { "active" } else { "" },
                            src: "{src}",
                            alt: "AI avatar option",
                            onclick: move |_| report(status, ctx.write().preferences.set_ai_avatar(src)),
                        }
                    }
                }
                button {
                    class: "btn", r#type: "button",
                    onclick: move |_| report(status, ctx.write().preferences.reset_avatar(AvatarSlot::Ai)),
                    "Reset"
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "Theme" }
                div { class: "theme-toggle",
                    for (mode, label) in [(ThemeMode::Light, "Light"), (ThemeMode::Dark, "Dark"), (ThemeMode::System, "System")] {
                        button {
                            key: "{label}",
                            class: format_args!(
                                "theme-option {}",
                                if display.theme == mode { "active" } else { "" }
                            ),
                            r#type: "button",
                            onclick: move |_| report(status, ctx.write().preferences.set_theme(mode)),
                            "{label}"
                        }
                    }
                }
            }
            if let Some(message) = status() {
                p { class: "error-text", "{message}" }
            }
        }
    }
}
