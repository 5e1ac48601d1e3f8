/// Model provider layer for gemchat
///
/// This module defines the provider-agnostic streaming contract used by the
/// boundary service, plus the Gemini backend that fulfils it.
///
/// # Architecture
///
/// - `ModelProvider` - opens a streaming completion and hands back a `FragmentStream`
/// - `FragmentSink` - producer half used by backends inside their pump task
/// - `gemini` - Google Gemini `streamGenerateContent` over server-sent events
/// - `sse` - incremental `data:` payload decoder shared by backends
///
/// # Usage
///
/// ```rust,no_run
/// use futures::StreamExt;
/// use gemchat::ai::{GeminiProvider, ModelProvider};
/// use gemchat::config::ProviderConfig;
/// use gemchat::request::ChatRequest;
///
/// # async fn example() -> anyhow::Result<()> {
/// let provider = GeminiProvider::new(ProviderConfig::from_env()?);
/// let request = ChatRequest {
///     message: "Hello!".into(),
///     image: None,
///     history: Vec::new(),
///     preferences: None,
/// };
/// let mut fragments = provider.stream_chat(request.into_provider_request()).await?;
/// while let Some(fragment) = fragments.next().await {
///     print!("{}", fragment?);
/// }
/// # Ok(())
/// # }
/// ```
mod gemini;
pub mod sse;

pub use gemini::{GeminiProvider, parse_gemini_sse_data};

use crate::request::ProviderRequest;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;

// ============================================
// Error Types
// ============================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("invalid provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("response exceeded {0:?}")]
    Timeout(Duration),
}

impl ChatError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Text fragments in arrival order. An `Err` item ends the stream as a failure.
pub type FragmentStream = BoxStream<'static, ChatResult<String>>;

// ============================================
// Streaming plumbing
// ============================================

/// Producer half of a [`FragmentStream`].
pub struct FragmentSink {
    tx: mpsc::UnboundedSender<ChatResult<String>>,
}

impl FragmentSink {
    pub fn channel() -> (Self, FragmentStream) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx.boxed())
    }

    /// Forward one fragment. Returns `false` once the consumer has gone away.
    pub fn append(&self, piece: &str) -> bool {
        self.tx.unbounded_send(Ok(piece.to_string())).is_ok()
    }

    pub fn finish(self) {
        self.tx.close_channel();
    }

    pub fn fail(self, err: ChatError) {
        let _ = self.tx.unbounded_send(Err(err));
        self.tx.close_channel();
    }
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Start a streaming completion. Errors before the first byte are returned
    /// directly; later failures arrive as an `Err` item on the stream.
    async fn stream_chat(&self, request: ProviderRequest) -> ChatResult<FragmentStream>;
}
