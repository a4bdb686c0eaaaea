//! Scripted LlmClient for tests
//!
//! Replies are handed out in order, one per call. Every request is recorded
//! so tests can assert on what was actually sent to the model.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StreamChunk};

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(CompletionResponse),
    /// Fails the call with an `ApiError { status: 500 }`
    Fail(String),
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Response(CompletionResponse::text(content))
    }

    pub fn tool(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::Response(CompletionResponse::tool(name, input))
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// Mock LLM client
pub struct MockLlmClient {
    replies: Vec<MockReply>,
    call_count: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    pub fn new(replies: Vec<MockReply>) -> Self {
        debug!(reply_count = %replies.len(), "MockLlmClient::new: called");
        Self {
            replies,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_reply(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        debug!(%idx, "MockLlmClient::next_reply: fetching reply");
        match self.replies.get(idx) {
            Some(MockReply::Response(response)) => Ok(response.clone()),
            Some(MockReply::Fail(message)) => Err(LlmError::ApiError {
                status: 500,
                message: message.clone(),
            }),
            None => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.next_reply(request)
    }

    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError> {
        let result = self.next_reply(request);
        match &result {
            Ok(response) => {
                if let Some(text) = &response.content {
                    let _ = chunk_tx.send(StreamChunk::TextDelta(text.clone())).await;
                }
                let _ = chunk_tx
                    .send(StreamChunk::MessageDone {
                        stop_reason: response.stop_reason.clone(),
                        usage: response.usage.clone(),
                    })
                    .await;
            }
            Err(e) => {
                let _ = chunk_tx.send(StreamChunk::Error(e.to_string())).await;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new("Test", vec![Message::user(text)], 1000)
    }

    #[tokio::test]
    async fn test_mock_client_returns_replies_in_order() {
        let client = MockLlmClient::new(vec![MockReply::text("Response 1"), MockReply::fail("boom")]);

        let resp1 = client.complete(request("a")).await.unwrap();
        assert_eq!(resp1.content, Some("Response 1".to_string()));

        let err = client.complete(request("b")).await.unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 500, .. }));

        assert_eq!(client.call_count(), 2);
        let recorded = client.requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[1].messages[0].content, "b");
    }

    #[tokio::test]
    async fn test_mock_client_errors_when_exhausted() {
        let client = MockLlmClient::new(vec![]);
        assert!(client.complete(request("a")).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_stream_forwards_text() {
        let client = MockLlmClient::new(vec![MockReply::text("streamed")]);
        let (tx, mut rx) = mpsc::channel(8);

        let response = client.stream(request("a"), tx).await.unwrap();
        assert_eq!(response.content.as_deref(), Some("streamed"));

        match rx.recv().await {
            Some(StreamChunk::TextDelta(text)) => assert_eq!(text, "streamed"),
            other => panic!("Expected TextDelta, got {:?}", other),
        }
        assert!(matches!(rx.recv().await, Some(StreamChunk::MessageDone { .. })));
    }
}
