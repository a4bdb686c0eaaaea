//! HTTP plumbing shared by the provider clients
//!
//! Every request is sent exactly once. A 429 is reported with its
//! `retry-after`; whether to try again is left to the user.

use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::{CompletionResponse, LlmError, StopReason, StreamChunk, TokenUsage};
use crate::config::LlmConfig;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Connection settings common to every provider
pub(super) struct Endpoint {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub http: Client,
    /// Upper bound applied to every request's `max_tokens`
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "Endpoint::from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn cap(&self, requested: u32) -> u32 {
        requested.min(self.max_tokens)
    }

    /// Classify a transport failure; the client timeout gets its own variant
    pub fn transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Network(error)
        }
    }

    /// Send one request and map any non-success status to an error
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, LlmError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        debug!(status = status.as_u16(), "Endpoint::send: request failed");
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }

        Err(LlmError::ApiError {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        })
    }
}

fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

/// Report a stream failure on the channel and hand back the error
pub(super) async fn fail_stream(chunk_tx: &mpsc::Sender<StreamChunk>, error: LlmError) -> LlmError {
    let _ = chunk_tx.send(StreamChunk::Error(error.to_string())).await;
    error
}

/// Text and bookkeeping gathered while a stream is read
#[derive(Debug, Default)]
pub(super) struct StreamState {
    pub text: String,
    pub stop_reason: Option<StopReason>,
    pub usage: TokenUsage,
}

impl StreamState {
    pub async fn push_text(&mut self, chunk_tx: &mpsc::Sender<StreamChunk>, delta: &str) {
        self.text.push_str(delta);
        let _ = chunk_tx.send(StreamChunk::TextDelta(delta.to_string())).await;
    }

    /// Send `MessageDone` and fold the state into a response
    pub async fn finish(self, chunk_tx: &mpsc::Sender<StreamChunk>) -> CompletionResponse {
        let stop_reason = self.stop_reason.unwrap_or(StopReason::EndTurn);
        debug!(total_tokens = self.usage.total(), ?stop_reason, "StreamState::finish: called");
        let _ = chunk_tx
            .send(StreamChunk::MessageDone {
                stop_reason: stop_reason.clone(),
                usage: self.usage.clone(),
            })
            .await;

        CompletionResponse {
            content: (!self.text.is_empty()).then_some(self.text),
            tool_calls: Vec::new(),
            stop_reason,
            usage: self.usage,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::sync::atomic::Ordering;

    fn endpoint(base_url: String) -> Endpoint {
        Endpoint {
            model: "test-model".to_string(),
            api_key: "test-key".to_string(),
            base_url,
            http: Client::new(),
            max_tokens: 1000,
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_sent_once() {
        let (base_url, hits) = test_server::serve("503 Service Unavailable", "", r#"{"error":"overloaded"}"#).await;
        let endpoint = endpoint(base_url);

        let result = endpoint.send(endpoint.http.post(endpoint.url("/v1/messages")).body("{}")).await;

        assert!(matches!(result, Err(LlmError::ApiError { status: 503, ref message }) if message.contains("overloaded")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_is_sent_once() {
        let (base_url, hits) = test_server::serve("429 Too Many Requests", "retry-after: 5\r\n", "{}").await;
        let endpoint = endpoint(base_url);

        let result = endpoint.send(endpoint.http.get(endpoint.url("/"))).await;

        assert!(matches!(result, Err(LlmError::RateLimited { retry_after }) if retry_after == Duration::from_secs(5)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), Duration::from_secs(60));

        headers.insert("retry-after", HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Duration::from_secs(7));

        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_stream_state_finish() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut state = StreamState::default();
        state.push_text(&tx, "Hel").await;
        state.push_text(&tx, "lo").await;
        state.usage.output_tokens = 2;

        let response = state.finish(&tx).await;

        assert_eq!(response.content.as_deref(), Some("Hello"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert!(matches!(rx.recv().await, Some(StreamChunk::TextDelta(t)) if t == "Hel"));
        assert!(matches!(rx.recv().await, Some(StreamChunk::TextDelta(t)) if t == "lo"));
        assert!(matches!(rx.recv().await, Some(StreamChunk::MessageDone { .. })));
    }

    #[tokio::test]
    async fn test_empty_stream_has_no_content() {
        let (tx, _rx) = mpsc::channel(8);
        let response = StreamState::default().finish(&tx).await;
        assert!(response.content.is_none());
    }
}
