pub mod ai;
pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod conversation;
pub mod preferences;
pub mod request;
pub mod server;
pub mod storage;
pub mod theme;
pub mod types;

#[cfg(feature = "desktop")]
pub mod ui;
#[cfg(feature = "desktop")]
pub mod views;
