//! Anthropic Messages API client
//!
//! Structured output is requested by offering one tool and pinning
//! `tool_choice` to it; the tool's `input` object is the payload.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::RequestBuilder;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use super::transport::{Endpoint, StreamState, fail_stream};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, StopReason, StreamChunk, TokenUsage, ToolCall};
use crate::config::LlmConfig;

const API_VERSION: &str = "2023-06-01";
const MESSAGES_PATH: &str = "/v1/messages";

pub struct AnthropicClient {
    endpoint: Endpoint,
}

impl AnthropicClient {
    /// Build a client; fails when the configured API key variable is unset
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest, stream: bool) -> MessagesBody<'a> {
        debug!(model = %self.endpoint.model, tools = request.tools.len(), stream, "AnthropicClient::body: called");
        MessagesBody {
            model: &self.endpoint.model,
            max_tokens: self.endpoint.cap(request.max_tokens),
            system: &request.system_prompt,
            messages: &request.messages,
            tools: request.tools.iter().map(|t| t.to_anthropic_schema()).collect(),
            tool_choice: request
                .tool_choice
                .as_deref()
                .filter(|_| !request.tools.is_empty())
                .map(|name| ToolChoice { kind: "tool", name }),
            stream,
        }
    }

    fn post(&self, body: &MessagesBody<'_>) -> RequestBuilder {
        self.endpoint
            .http
            .post(self.endpoint.url(MESSAGES_PATH))
            .header("x-api-key", &self.endpoint.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, "AnthropicClient::complete: called");
        let body = self.body(&request, false);
        let response = self.endpoint.send(self.post(&body)).await?;
        let reply: MessagesReply = response.json().await?;
        let parsed = reply.into_completion();
        debug!(total_tokens = parsed.usage.total(), tool_calls = parsed.tool_calls.len(), "AnthropicClient::complete: done");
        Ok(parsed)
    }

    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.endpoint.model, "AnthropicClient::stream: called");
        let body = self.body(&request, true);
        let mut events = EventSource::new(self.post(&body)).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let mut state = StreamState::default();

        while let Some(event) = events.next().await {
            let message = match event {
                Ok(Event::Open) => continue,
                Ok(Event::Message(message)) => message,
                Err(e) => {
                    events.close();
                    return Err(fail_stream(&chunk_tx, LlmError::InvalidResponse(e.to_string())).await);
                }
            };

            let event = match serde_json::from_str::<StreamEvent>(&message.data) {
                Ok(event) => event,
                Err(e) => {
                    events.close();
                    return Err(fail_stream(&chunk_tx, LlmError::Json(e)).await);
                }
            };

            match event {
                StreamEvent::MessageStart { message } => {
                    state.usage.input_tokens = message.usage.input_tokens;
                }
                StreamEvent::ContentBlockDelta {
                    delta: BlockDelta::TextDelta { text },
                } => state.push_text(&chunk_tx, &text).await,
                StreamEvent::MessageDelta { delta, usage } => {
                    if let Some(reason) = delta.stop_reason {
                        state.stop_reason = Some(StopReason::from_anthropic(&reason));
                    }
                    state.usage.output_tokens = usage.output_tokens;
                }
                StreamEvent::MessageStop => break,
                StreamEvent::Error { error } => {
                    events.close();
                    return Err(fail_stream(&chunk_tx, LlmError::InvalidResponse(error.message)).await);
                }
                StreamEvent::ContentBlockDelta { .. } | StreamEvent::Ignored => {}
            }
        }
        events.close();

        Ok(state.finish(&chunk_tx).await)
    }
}

// Wire shapes

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ReplyBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

impl MessagesReply {
    fn into_completion(self) -> CompletionResponse {
        let mut text: Option<String> = None;
        let mut tool_calls = Vec::new();

        for block in self.content {
            match block {
                ReplyBlock::Text { text: part } => text.get_or_insert_with(String::new).push_str(&part),
                ReplyBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall { id, name, input }),
                ReplyBlock::Other => {}
            }
        }

        CompletionResponse {
            content: text,
            tool_calls,
            stop_reason: self
                .stop_reason
                .as_deref()
                .map(StopReason::from_anthropic)
                .unwrap_or(StopReason::EndTurn),
            usage: TokenUsage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplyBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: StartedMessage,
    },
    ContentBlockDelta {
        delta: BlockDelta,
    },
    MessageDelta {
        delta: StopDelta,
        #[serde(default)]
        usage: Usage,
    },
    MessageStop,
    Error {
        error: StreamFailure,
    },
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Deserialize)]
struct StartedMessage {
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct StopDelta {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamFailure {
    message: String,
}
