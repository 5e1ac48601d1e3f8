//! Environment-driven configuration. Binaries call `dotenvy::dotenv()` first,
//! so a local `.env` file feeds the same variables.

use anyhow::{Context, Result, anyhow};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/chat";
pub const MAX_OUTPUT_TOKENS: u32 = 1000;
pub const TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_output_tokens: u32,
    pub temperature: f64,
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("GOOGLE_API_KEY is not set"))?;
        Ok(Self {
            api_key,
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_request_duration: Duration,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_request_duration: DEFAULT_MAX_DURATION,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind = env::var("GEMCHAT_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .with_context(|| format!("GEMCHAT_BIND is not a socket address: {bind}"))?;
        let max_request_duration = match env::var("GEMCHAT_MAX_DURATION_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("GEMCHAT_MAX_DURATION_SECS is not a number: {raw}"))?,
            ),
            Err(_) => DEFAULT_MAX_DURATION,
        };
        let max_upload_bytes = match env::var("GEMCHAT_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("GEMCHAT_MAX_UPLOAD_BYTES is not a number: {raw}"))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };
        Ok(Self {
            bind,
            max_request_duration,
            max_upload_bytes,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub endpoint: String,
    pub data_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("GEMCHAT_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            data_dir: crate::storage::default_data_dir(),
        }
    }
}

/// Load `.env` if present. A missing file is not an error.
pub fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        eprintln!("failed to read .env: {err}");
    }
}

/// `RUST_LOG` wins; otherwise log this crate at info.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gemchat=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
