//! OpenAI Chat Completions client
//!
//! The system prompt travels as the first `system` message. Forced tools
//! use the function-calling shape, and tool arguments arrive as a JSON
//! string that is decoded here.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

use super::transport::{Endpoint, StreamState, fail_stream};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, StreamChunk, TokenUsage, ToolCall};
use crate::config::LlmConfig;

const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const DONE_MARKER: &str = "[DONE]";

/// Reasoning model families reject `max_tokens`
fn takes_completion_tokens(model: &str) -> bool {
    ["gpt-5", "o1", "o3", "o4"].iter().any(|prefix| model.starts_with(prefix))
}

pub struct OpenAIClient {
    endpoint: Endpoint,
}

impl OpenAIClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    fn body(&self, request: &CompletionRequest, stream: bool) -> Value {
        debug!(model = %self.endpoint.model, tools = request.tools.len(), stream, "OpenAIClient::body: called");
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(json!({ "role": "system", "content": request.system_prompt }));
        messages.extend(request.messages.iter().map(|m| json!(m)));

        let token_field = if takes_completion_tokens(&self.endpoint.model) {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };

        let mut body = json!({ "model": self.endpoint.model, "messages": messages });
        body[token_field] = json!(self.endpoint.cap(request.max_tokens));

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request.tools.iter().map(|t| t.to_openai_schema()).collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = request
                .tool_choice
                .as_ref()
                .map(|name| json!({ "type": "function", "function": { "name": name } }))
                .unwrap_or_else(|| json!("auto"));
        }

        if stream {
            body["stream"] = json!(true);
            body["stream_options"] = json!({ "include_usage": true });
        }

        body
    }

    fn post(&self, body: &Value) -> RequestBuilder {
        self.endpoint
            .http
            .post(self.endpoint.url(COMPLETIONS_PATH))
            .bearer_auth(&self.endpoint.api_key)
            .json(body)
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, "OpenAIClient::complete: called");
        let body = self.body(&request, false);
        let response = self.endpoint.send(self.post(&body)).await?;
        let reply: ChatReply = response.json().await?;
        let parsed = reply.into_completion()?;
        debug!(total_tokens = parsed.usage.total(), tool_calls = parsed.tool_calls.len(), "OpenAIClient::complete: done");
        Ok(parsed)
    }

    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, "OpenAIClient::stream: called");
        let body = self.body(&request, true);

        let response = match self.endpoint.send(self.post(&body)).await {
            Ok(response) => response,
            Err(e) => return Err(fail_stream(&chunk_tx, e).await),
        };

        let mut bytes = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut state = StreamState::default();

        while let Some(next) = bytes.next().await {
            let chunk = match next {
                Ok(chunk) => chunk,
                Err(e) => return Err(fail_stream(&chunk_tx, self.endpoint.transport_error(e)).await),
            };

            for line in lines.push(&chunk) {
                let Some(data) = sse_data(&line) else {
                    continue;
                };
                let Ok(delta) = serde_json::from_str::<StreamDelta>(data) else {
                    debug!("OpenAIClient::stream: skipping unparsable event");
                    continue;
                };

                if let Some(choice) = delta.choices.into_iter().next() {
                    if let Some(text) = choice.delta.content {
                        state.push_text(&chunk_tx, &text).await;
                    }
                    if let Some(reason) = choice.finish_reason {
                        state.stop_reason = Some(StopReason::from_openai(&reason));
                    }
                }
                // Only the final event carries usage
                if let Some(usage) = delta.usage {
                    state.usage = usage.into();
                }
            }
        }

        Ok(state.finish(&chunk_tx).await)
    }
}

/// Splits raw stream bytes into lines
///
/// Bytes are held until a newline arrives, so a UTF-8 sequence split
/// across network chunks is decoded whole.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append `bytes` and drain every complete line
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

/// Payload of a `data:` line, excluding the terminal marker
fn sse_data(line: &str) -> Option<&str> {
    let data = line.trim().strip_prefix("data:")?.trim_start();
    (!data.is_empty() && data != DONE_MARKER).then_some(data)
}

// Wire shapes

#[derive(Debug, Deserialize)]
struct ChatReply {
    choices: Vec<ReplyChoice>,
    #[serde(default)]
    usage: Usage,
}

impl ChatReply {
    fn into_completion(self) -> Result<CompletionResponse, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Response has no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                Ok(ToolCall {
                    id: call.id,
                    name: call.function.name,
                    input: serde_json::from_str(&call.function.arguments)?,
                })
            })
            .collect::<Result<Vec<_>, LlmError>>()?;

        Ok(CompletionResponse {
            content: choice.message.content,
            tool_calls,
            stop_reason: choice
                .finish_reason
                .as_deref()
                .map(StopReason::from_openai)
                .unwrap_or(StopReason::EndTurn),
            usage: self.usage.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
    tool_calls: Option<Vec<FunctionCall>>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    id: String,
    function: FunctionPayload,
}

#[derive(Debug, Deserialize)]
struct FunctionPayload {
    name: String,
    arguments: String,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    delta: DeltaBody,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeltaBody {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::transport::test_server;
    use crate::llm::{Message, ToolDefinition};
    use reqwest::Client;
    use std::sync::atomic::Ordering;

    fn client(model: &str, max_tokens: u32) -> OpenAIClient {
        client_at("https://api.openai.com", model, max_tokens)
    }

    fn client_at(base_url: &str, model: &str, max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            endpoint: Endpoint {
                model: model.to_string(),
                api_key: "test-key".to_string(),
                base_url: base_url.to_string(),
                http: Client::new(),
                max_tokens,
                timeout: std::time::Duration::from_secs(30),
            },
        }
    }

    #[test]
    fn test_system_prompt_leads_messages() {
        let request = CompletionRequest::new("You are helpful", vec![Message::user("Hello")], 1000);

        let body = client("gpt-4o", 8192).body(&request, false);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "You are helpful"}));
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "Hello"}));
        assert!(body.get("tools").is_none());
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_reasoning_models_use_completion_tokens() {
        let request = CompletionRequest::new("Test", vec![], 5000);
        let body = client("o3-mini", 1000).body(&request, false);
        assert_eq!(body["max_completion_tokens"], 1000);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_forced_tool_and_stream_options() {
        let request = CompletionRequest::new("sys", vec![Message::user("go")], 100).with_forced_tool(
            ToolDefinition::new("submit_week_plan", "Submit", json!({"type": "object"})),
        );

        let body = client("gpt-4o", 8192).body(&request, true);

        assert_eq!(body["tools"][0]["function"]["name"], "submit_week_plan");
        assert_eq!(body["tool_choice"]["function"]["name"], "submit_week_plan");
        assert_eq!(body["stream_options"]["include_usage"], true);
    }

    #[test]
    fn test_tool_arguments_decoded() {
        let reply: ChatReply = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "submit_week_plan", "arguments": "{\"plans\":[]}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        }))
        .unwrap();

        let parsed = reply.into_completion().unwrap();

        assert_eq!(parsed.tool_calls[0].input["plans"], json!([]));
        assert_eq!(parsed.stop_reason, StopReason::ToolUse);
        assert_eq!(parsed.usage.total(), 7);
    }

    #[test]
    fn test_bad_tool_arguments_are_an_error() {
        let reply: ChatReply = serde_json::from_value(json!({
            "choices": [{
                "message": {"tool_calls": [{"id": "c", "function": {"name": "f", "arguments": "{not json"}}]},
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();
        assert!(matches!(reply.into_completion(), Err(LlmError::Json(_))));
    }

    #[test]
    fn test_reply_without_choices_is_invalid() {
        let reply: ChatReply = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(reply.into_completion(), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_sse_data_lines() {
        assert_eq!(sse_data("data: {\"a\":1}\n"), Some("{\"a\":1}"));
        assert_eq!(sse_data("data:{}\r\n"), Some("{}"));
        assert_eq!(sse_data("data: [DONE]\n"), None);
        assert_eq!(sse_data(": keep-alive\n"), None);
        assert_eq!(sse_data("\n"), None);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let event = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n".as_bytes();
        let split = event.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut lines = LineBuffer::default();

        assert!(lines.push(&event[..split]).is_empty());
        let decoded = lines.push(&event[split..]);

        assert_eq!(decoded.len(), 1);
        let delta: StreamDelta = serde_json::from_str(sse_data(&decoded[0]).unwrap()).unwrap();
        assert_eq!(delta.choices[0].delta.content.as_deref(), Some("café"));
    }

    #[test]
    fn test_line_buffer_holds_partial_line() {
        let mut lines = LineBuffer::default();
        assert_eq!(lines.push(b"data: 1\ndata: "), vec!["data: 1\n".to_string()]);
        assert_eq!(lines.push(b"2\n\n"), vec!["data: 2\n".to_string(), "\n".to_string()]);
    }

    #[tokio::test]
    async fn test_server_error_is_not_resent() {
        let (base_url, hits) = test_server::serve("503 Service Unavailable", "", "{}").await;
        let request = CompletionRequest::new("sys", vec![Message::user("Hello")], 100);

        let result = client_at(&base_url, "gpt-4o", 1000).complete(request).await;

        assert!(matches!(result, Err(LlmError::ApiError { status: 503, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_keeps_multibyte_text() {
        let (base_url, _) = test_server::serve(
            "200 OK",
            "content-type: text/event-stream\r\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"caf\u{e9} \"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"ol\u{e9}\"},\"finish_reason\":\"stop\"}]}\n\ndata: [DONE]\n\n",
        )
        .await;
        let (tx, _rx) = mpsc::channel(16);
        let request = CompletionRequest::new("sys", vec![Message::user("Hello")], 100);

        let reply = client_at(&base_url, "gpt-4o", 1000).stream(request, tx).await.unwrap();

        assert_eq!(reply.content.as_deref(), Some("café olé"));
        assert_eq!(reply.stop_reason, StopReason::EndTurn);
    }
}
