use crate::client::HttpTransport;
use crate::config::ClientConfig;
use crate::context::AppContext;
use crate::conversation::Conversation;
use crate::theme::{BASE_CSS, theme_definition};
use crate::views::{ChatView, CommandsView, PreferencesView, SettingsView};
use dioxus::prelude::*;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AppTab {
    Chat,
    Preferences,
    Commands,
    Settings,
}

#[component]
pub fn App() -> Element {
    let config = use_hook(ClientConfig::from_env);
    let ctx = use_signal(|| AppContext::open_at(&config.data_dir));
    let transport = use_signal(|| open_transport(&config));
    let conversation = use_signal(Conversation::new);
    let active_tab = use_signal(|| AppTab::Chat);

    let theme = theme_definition(ctx.read().applied_theme());

    rsx! {
        style { dangerous_inner_html: "{BASE_CSS}" }
        style { dangerous_inner_html: "{theme.css}" }
        div { class: "app {theme.root_class}",
            AppHeader { active_tab }
            TabPanels {
                active_tab,
                ctx,
                conversation,
                transport,
            }
        }
    }
}

fn open_transport(config: &ClientConfig) -> Option<Arc<HttpTransport>> {
    match HttpTransport::from_config(config) {
        Ok(transport) => {
            tracing::info!(endpoint = transport.endpoint(), "chat endpoint configured");
            Some(Arc::new(transport))
        }
        Err(err) => {
            tracing::error!(error = %err, "chat endpoint unusable");
            None
        }
    }
}

#[component]
fn AppHeader(active_tab: Signal<AppTab>) -> Element {
    rsx! {
        div { class: "header",
            h1 { class: "tab active", "Gemchat" }
            TabNavigation { active_tab }
        }
    }
}

#[component]
fn TabPanels(
    active_tab: Signal<AppTab>,
    ctx: Signal<AppContext>,
    conversation: Signal<Conversation>,
    transport: Signal<Option<Arc<HttpTransport>>>,
) -> Element {
    rsx! {
        div { class: "tab-panels",
            TabPanel {
                active_tab,
                tab: AppTab::Chat,
                children: rsx!( ChatView { ctx, conversation, transport } ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Preferences,
                children: rsx!( PreferencesView { ctx } ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Commands,
                children: rsx!( CommandsView { ctx } ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Settings,
                children: rsx!( SettingsView { ctx } ),
            }
        }
    }
}

#[component]
fn TabPanel(active_tab: Signal<AppTab>, tab: AppTab, children: Element) -> Element {
    let is_active = active_tab() == tab;
    let class_suffix = if is_active { "active" } else { "" };
    rsx! {
        div {
            class: format_args!("tab-panel {}", class_suffix),
            aria_hidden: (!is_active).to_string(),
            {children}
        }
    }
}

#[component]
fn TabNavigation(active_tab: Signal<AppTab>) -> Element {
    rsx! {
        div { class: "tabs",
            TabButton { active_tab, tab: AppTab::Chat, label: "Chat" }
            TabButton { active_tab, tab: AppTab::Preferences, label: "Preferences" }
            TabButton { active_tab, tab: AppTab::Commands, label: "Commands" }
            TabButton { active_tab, tab: AppTab::Settings, label: "Settings" }
        }
    }
}

#[component]
fn TabButton(active_tab: Signal<AppTab>, tab: AppTab, label: &'static str) -> Element {
    let mut active_tab = active_tab;
    let class = if active_tab() == tab {
        "tab active"
    } else {
        "tab"
    };
    rsx! {
        h2 {
            class: class,
            onclick: move |_| active_tab.set(tab),
            "{label}"
        }
    }
}
