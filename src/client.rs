//! Client side of the boundary: posts a [`ChatRequest`] and turns the streamed
//! body back into text fragments.

use crate::ai::{ChatError, ChatResult, FragmentStream};
use crate::config::ClientConfig;
use crate::request::ChatRequest;
use async_trait::async_trait;
use futures::{Stream, StreamExt};

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open the response stream for one turn. Transport failures and
    /// non-success statuses are returned before any fragment.
    async fn send(&self, request: &ChatRequest) -> ChatResult<FragmentStream>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> ChatResult<Self> {
        let endpoint = reqwest::Url::parse(endpoint)
            .map_err(|err| ChatError::Config(format!("invalid chat endpoint {endpoint}: {err}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    pub fn from_config(config: &ClientConfig) -> ChatResult<Self> {
        Self::new(&config.endpoint)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> ChatResult<FragmentStream> {
        let form = request.to_form()?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }
        Ok(decode_body(response.bytes_stream()))
    }
}

/// Decode a byte stream into UTF-8 text fragments as chunks arrive.
pub fn decode_body<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ChatError> + Send + 'static,
{
    let state = Some((body.boxed(), Utf8StreamDecoder::default()));
    futures::stream::unfold(state, |state| async move {
        let (mut body, mut decoder) = state?;
        loop {
            match body.next().await {
                Some(Ok(chunk)) => {
                    let text = decoder.decode(chunk.as_ref());
                    if !text.is_empty() {
                        return Some((Ok(text), Some((body, decoder))));
                    }
                }
                Some(Err(err)) => return Some((Err(err.into()), None)),
                None => {
                    let tail = decoder.finish();
                    return (!tail.is_empty()).then_some((Ok(tail), None));
                }
            }
        }
    })
    .boxed()
}

/// Streaming UTF-8 decoder: an incomplete trailing sequence is held until the
/// next chunk, invalid bytes become U+FFFD.
#[derive(Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            let (valid, invalid_len) = match std::str::from_utf8(&self.pending) {
                Ok(_) => (self.pending.len(), None),
                Err(err) => (err.valid_up_to(), err.error_len()),
            };
            out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));

            match invalid_len {
                Some(len) => {
                    out.push(char::REPLACEMENT_CHARACTER);
                    self.pending.drain(..valid + len);
                }
                None => {
                    self.pending.drain(..valid);
                    return out;
                }
            }
        }
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_rejects_malformed_endpoint() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(ChatError::Config(_))
        ));
        let transport = HttpTransport::new("http://127.0.0.1:3000/api/chat").unwrap();
        assert_eq!(transport.endpoint(), "http://127.0.0.1:3000/api/chat");
    }

    #[test]
    fn split_character_is_held_until_complete() {
        let mut decoder = Utf8StreamDecoder::default();
        let bytes = "caf\u{e9}".as_bytes();
        assert_eq!(decoder.decode(&bytes[..4]), "caf");
        assert_eq!(decoder.decode(&bytes[4..]), "\u{e9}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut decoder = Utf8StreamDecoder::default();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{fffd}b");
    }

    #[test]
    fn truncated_tail_is_flushed_lossily() {
        let mut decoder = Utf8StreamDecoder::default();
        assert_eq!(decoder.decode(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }

    #[tokio::test]
    async fn decode_body_yields_text_in_arrival_order() {
        let emoji = "\u{1f600}".as_bytes().to_vec();
        let chunks: Vec<Result<Vec<u8>, ChatError>> = vec![
            Ok(b"Hel".to_vec()),
            Ok(emoji[..2].to_vec()),
            Ok(emoji[2..].to_vec()),
            Ok(b"lo".to_vec()),
        ];
        let fragments: Vec<String> = decode_body(futures::stream::iter(chunks))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(fragments, vec!["Hel", "\u{1f600}", "lo"]);
    }

    #[tokio::test]
    async fn decode_body_surfaces_errors_and_stops() {
        let chunks: Vec<Result<Vec<u8>, ChatError>> = vec![
            Ok(b"partial".to_vec()),
            Err(ChatError::provider("reset")),
            Ok(b"never".to_vec()),
        ];
        let items: Vec<_> = decode_body(futures::stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "partial");
        assert!(items[1].is_err());
    }
}
