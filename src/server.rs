//! Boundary service: accepts the multipart chat request, opens a streaming
//! completion with the model provider and re-emits the fragments as a plain
//! UTF-8 body.

use crate::ai::{ChatError, FragmentStream, ModelProvider};
use crate::config::ServerConfig;
use crate::request::{
    ChatRequest, FIELD_HISTORY, FIELD_IMAGE, FIELD_MESSAGE, FIELD_PREFERENCES, RequestError,
};
use crate::types::ImageAttachment;
use axum::{
    Json, Router,
    body::Body,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn ModelProvider>,
    max_request_duration: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    BadRequest(#[from] RequestError),

    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("not a multipart request: {0}")]
    NotMultipart(#[from] MultipartRejection),

    #[error("provider call failed: {0}")]
    Upstream(ChatError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::BadRequest(err) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
            ProxyError::Multipart(err) => {
                (err.status(), Json(json!({ "error": err.body_text() }))).into_response()
            }
            ProxyError::NotMultipart(err) => {
                (err.status(), Json(json!({ "error": err.body_text() }))).into_response()
            }
            // Provider details stay in the server log.
            ProxyError::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process request" })),
            )
                .into_response(),
        }
    }
}

pub fn router(provider: Arc<dyn ModelProvider>, config: &ServerConfig) -> Router {
    let state = AppState {
        provider,
        max_request_duration: config.max_request_duration,
    };

    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(provider: Arc<dyn ModelProvider>, config: ServerConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "gemchat proxy listening");

    axum::serve(listener, router(provider, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gemchat proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn health_check() -> &'static str {
    "OK"
}

async fn handle_chat(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ProxyError> {
    let deadline = Instant::now() + state.max_request_duration;
    let request = read_request(multipart?).await?;
    tracing::debug!(
        history = request.history.len(),
        has_image = request.image.is_some(),
        has_preferences = request.preferences.is_some(),
        "chat request"
    );

    let opened = tokio::time::timeout_at(
        deadline,
        state.provider.stream_chat(request.into_provider_request()),
    )
    .await
    .unwrap_or(Err(ChatError::Timeout(state.max_request_duration)));

    let fragments = opened.map_err(|err| {
        tracing::error!(error = %err, "failed to open provider stream");
        ProxyError::Upstream(err)
    })?;

    let body = Body::from_stream(bounded(
        fragments,
        deadline,
        state.max_request_duration,
    ));
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

async fn read_request(mut multipart: Multipart) -> Result<ChatRequest, ProxyError> {
    let mut message = None;
    let mut image = None;
    let mut history = None;
    let mut preferences = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_MESSAGE => message = Some(field.text().await?),
            FIELD_HISTORY => history = Some(field.text().await?),
            FIELD_PREFERENCES => preferences = Some(field.text().await?),
            FIELD_IMAGE => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                if !data.is_empty() {
                    let mut attachment = ImageAttachment::new(mime_type, data.to_vec());
                    attachment.file_name = file_name;
                    image = Some(attachment);
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    Ok(ChatRequest::from_fields(
        message,
        image,
        history.as_deref(),
        preferences.as_deref(),
    )?)
}

/// Forward fragments until the stream ends, fails, or `deadline` passes.
/// A failure is the last item, so the body is aborted rather than closed.
pub fn bounded(fragments: FragmentStream, deadline: Instant, limit: Duration) -> FragmentStream {
    futures::stream::unfold(Some(fragments), move |state| async move {
        let mut fragments = state?;
        match tokio::time::timeout_at(deadline, fragments.next()).await {
            Ok(Some(Ok(piece))) => Some((Ok(piece), Some(fragments))),
            Ok(Some(Err(err))) => {
                tracing::error!(error = %err, "provider stream failed");
                Some((Err(err), None))
            }
            Ok(None) => None,
            Err(_) => {
                tracing::warn!(?limit, "response exceeded the request duration bound");
                Some((Err(ChatError::Timeout(limit)), None))
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::FragmentSink;

    #[tokio::test]
    async fn bounded_passes_fragments_through() {
        let (sink, stream) = FragmentSink::channel();
        sink.append("a");
        sink.append("b");
        sink.finish();

        let items: Vec<_> = bounded(stream, Instant::now() + Duration::from_secs(5), Duration::from_secs(5))
            .collect()
            .await;
        let pieces: Vec<_> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(pieces, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn bounded_stops_after_an_error() {
        let (sink, stream) = FragmentSink::channel();
        sink.append("a");
        sink.fail(ChatError::provider("boom"));

        let items: Vec<_> = bounded(stream, Instant::now() + Duration::from_secs(5), Duration::from_secs(5))
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out_a_stalled_stream() {
        let (sink, stream) = FragmentSink::channel();
        sink.append("early");
        let limit = Duration::from_secs(60);
        let mut bounded = bounded(stream, Instant::now() + limit, limit);

        assert_eq!(bounded.next().await.unwrap().unwrap(), "early");
        let err = bounded.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ChatError::Timeout(_)));
        assert!(bounded.next().await.is_none());
        drop(sink);
    }
}
