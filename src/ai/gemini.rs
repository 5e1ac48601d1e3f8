use super::sse::SseDecoder;
use super::{ChatError, ChatResult, FragmentSink, FragmentStream, ModelProvider};
use crate::config::ProviderConfig;
use crate::request::{ContentPart, ProviderRequest, ProviderRole};
use async_trait::async_trait;
use base64::Engine;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

// ---------------
// Request shapes
// ---------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

impl From<&ContentPart> for Part {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Part::Text(text.clone()),
            ContentPart::InlineImage { mime_type, data } => Part::InlineData(InlineData {
                mime_type: mime_type.clone(),
                data: base64::engine::general_purpose::STANDARD.encode(data),
            }),
        }
    }
}

impl GenerateContentRequest {
    fn new(request: &ProviderRequest, config: &ProviderConfig) -> Self {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|turn| Content {
                role: turn.role.as_str(),
                parts: turn.parts.iter().map(Part::from).collect(),
            })
            .collect();
        contents.push(Content {
            role: ProviderRole::User.as_str(),
            parts: request.parts.iter().map(Part::from).collect(),
        });
        Self {
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: config.max_output_tokens,
                temperature: config.temperature,
            },
        }
    }
}

// ---------------
// Response shapes (exported parser for tests)
// ---------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Decode one `data:` payload into its text, if any.
pub fn parse_gemini_sse_data(data: &str) -> ChatResult<Option<String>> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed: GenerateContentResponse = serde_json::from_str(trimmed)?;
    if let Some(err) = parsed.error {
        let status = err.status.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(ChatError::provider(format!("{status}: {}", err.message)));
    }
    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ChatError::provider(format!("prompt blocked: {reason}")));
    }

    let Some(first) = parsed.candidates.into_iter().next() else {
        return Ok(None);
    };
    if let Some(reason) = first.finish_reason.as_deref()
        && matches!(
            reason,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII"
        )
    {
        return Err(ChatError::provider(format!("response blocked: {reason}")));
    }

    let text: String = first
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();
    Ok(if text.is_empty() { None } else { Some(text) })
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn stream_chat(&self, request: ProviderRequest) -> ChatResult<FragmentStream> {
        let body = GenerateContentRequest::new(&request, &self.config);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .header("accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        let (sink, stream) = FragmentSink::channel();
        tokio::spawn(pump(response, sink));
        Ok(stream)
    }
}

async fn pump(response: reqwest::Response, sink: FragmentSink) {
    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();

    while let Some(item) = body.next().await {
        let bytes = match item {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "gemini stream interrupted");
                sink.fail(ChatError::from(err));
                return;
            }
        };
        for data in decoder.feed(&bytes) {
            match parse_gemini_sse_data(&data) {
                Ok(Some(piece)) => {
                    if !sink.append(&piece) {
                        tracing::debug!("consumer dropped, abandoning gemini stream");
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "gemini stream reported an error");
                    sink.fail(err);
                    return;
                }
            }
        }
    }

    if let Some(data) = decoder.finish() {
        match parse_gemini_sse_data(&data) {
            Ok(Some(piece)) => {
                sink.append(&piece);
            }
            Ok(None) => {}
            Err(err) => {
                sink.fail(err);
                return;
            }
        }
    }
    sink.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ProviderTurn;

    fn config() -> ProviderConfig {
        ProviderConfig {
            api_key: "test-key".into(),
            model: "gemini-1.5-flash".into(),
            base_url: "https://example.test/v1beta/".into(),
            max_output_tokens: 1000,
            temperature: 0.7,
        }
    }

    #[test]
    fn parses_gemini_data() {
        assert!(parse_gemini_sse_data("").unwrap().is_none());
        assert_eq!(
            parse_gemini_sse_data(
                r#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}],"role":"model"}}]}"#
            )
            .unwrap(),
            Some("Hello".to_string())
        );
        assert_eq!(
            parse_gemini_sse_data(
                r#"{"candidates":[{"content":{"parts":[],"role":"model"},"finishReason":"STOP"}]}"#
            )
            .unwrap(),
            None
        );
    }

    #[test]
    fn error_payloads_become_errors() {
        let err = parse_gemini_sse_data(
            r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("RESOURCE_EXHAUSTED"));

        assert!(
            parse_gemini_sse_data(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).is_err()
        );
        assert!(
            parse_gemini_sse_data(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).is_err()
        );
        assert!(parse_gemini_sse_data("not json").is_err());
    }

    #[test]
    fn request_body_carries_history_parts_and_budget() {
        let request = ProviderRequest {
            history: vec![ProviderTurn {
                role: ProviderRole::Model,
                parts: vec![ContentPart::Text("earlier".into())],
            }],
            parts: vec![
                ContentPart::Text("look".into()),
                ContentPart::InlineImage {
                    mime_type: "image/png".into(),
                    data: b"hi".to_vec(),
                },
            ],
        };
        let body = serde_json::to_value(GenerateContentRequest::new(&request, &config())).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [
                    {"role": "model", "parts": [{"text": "earlier"}]},
                    {"role": "user", "parts": [
                        {"text": "look"},
                        {"inlineData": {"mimeType": "image/png", "data": "aGk="}}
                    ]}
                ],
                "generationConfig": {"maxOutputTokens": 1000, "temperature": 0.7}
            })
        );
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let provider = GeminiProvider::new(config());
        assert_eq!(
            provider.endpoint(),
            "https://example.test/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }
}
