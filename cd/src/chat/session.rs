//! A conversation scoped to one day's theme
//!
//! The session owns two histories. `history` is what the model sees,
//! including the synthetic bootstrap turn. `transcript` is what the user
//! sees, with loading placeholders that are resolved in place.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::{ChatMessage, Platform, Profile};
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, StreamChunk};
use crate::prompts::PromptLoader;

use super::presets::{Preset, presets_for};

/// Seed turn that asks the model to open the conversation
pub const BOOTSTRAP_PROMPT: &str = "Introduce yourself briefly as my assistant for this platform and ask how you can help with today's content theme.";

/// Visible text of a reply that failed
pub const CHAT_ERROR_TEXT: &str = "Error connecting to AI. Please try again.";

const EMPTY_GREETING_TEXT: &str = "Ready to plan. What do you need?";
const EMPTY_REPLY_TEXT: &str = "I couldn't generate a response.";

/// Default token ceiling for a chat reply
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Remote call failed: {0}")]
    Remote(#[from] LlmError),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Session was already bootstrapped")]
    AlreadyBootstrapped,

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

pub struct ChatSession {
    llm: Arc<dyn LlmClient>,
    system_instruction: String,
    history: Vec<Message>,
    transcript: Vec<ChatMessage>,
    platform: Platform,
    day_theme: String,
    bootstrapped: bool,
    max_tokens: u32,
}

impl ChatSession {
    /// Open a session for one day
    ///
    /// The system instruction is rendered here and never changes afterwards.
    pub fn open(
        llm: Arc<dyn LlmClient>,
        prompts: &PromptLoader,
        profile: &Profile,
        day_theme: &str,
        day_description: &str,
    ) -> Result<Self, ChatError> {
        debug!(%day_theme, platform = %profile.platform, "ChatSession::open: called");
        let system_instruction = prompts
            .chat_system(profile, day_theme, day_description)
            .map_err(|e| ChatError::Prompt(e.to_string()))?;

        Ok(Self {
            llm,
            system_instruction,
            history: Vec::new(),
            transcript: Vec::new(),
            platform: profile.platform,
            day_theme: day_theme.to_string(),
            bootstrapped: false,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Visible messages, oldest first
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn day_theme(&self) -> &str {
        &self.day_theme
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn presets(&self) -> &'static [Preset] {
        presets_for(self.platform)
    }

    /// Ask the model for its opening message
    ///
    /// The bootstrap prompt joins the model history but never the visible
    /// transcript. On failure nothing visible is left behind.
    pub async fn bootstrap(&mut self) -> Result<ChatMessage, ChatError> {
        self.bootstrap_inner(None).await
    }

    /// Like `bootstrap`, forwarding text deltas as they arrive
    pub async fn bootstrap_streaming(&mut self, chunk_tx: mpsc::Sender<StreamChunk>) -> Result<ChatMessage, ChatError> {
        self.bootstrap_inner(Some(chunk_tx)).await
    }

    /// Send a user message and wait for the reply
    pub async fn send(&mut self, text: &str) -> Result<ChatMessage, ChatError> {
        self.send_inner(text, None).await
    }

    /// Like `send`, forwarding text deltas as they arrive
    pub async fn send_streaming(
        &mut self,
        text: &str,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatMessage, ChatError> {
        self.send_inner(text, Some(chunk_tx)).await
    }

    async fn bootstrap_inner(&mut self, chunk_tx: Option<mpsc::Sender<StreamChunk>>) -> Result<ChatMessage, ChatError> {
        debug!(bootstrapped = self.bootstrapped, "bootstrap: called");
        if self.bootstrapped {
            return Err(ChatError::AlreadyBootstrapped);
        }
        self.bootstrapped = true;

        let slot = self.push_placeholder();
        self.history.push(Message::user(BOOTSTRAP_PROMPT));

        match self.call(chunk_tx).await {
            Ok(response) => {
                let text = reply_text(response, EMPTY_GREETING_TEXT);
                self.history.push(Message::assistant(text.clone()));
                info!(theme = %self.day_theme, "Chat session started");
                Ok(self.resolve(slot, text))
            }
            Err(e) => {
                warn!(error = %e, "Chat bootstrap failed");
                self.history.pop();
                self.transcript.remove(slot);
                Err(e.into())
            }
        }
    }

    async fn send_inner(&mut self, text: &str, chunk_tx: Option<mpsc::Sender<StreamChunk>>) -> Result<ChatMessage, ChatError> {
        debug!(len = text.len(), "send: called");
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        self.transcript.push(ChatMessage::user(text));
        let slot = self.push_placeholder();
        self.history.push(Message::user(text));

        match self.call(chunk_tx).await {
            Ok(response) => {
                let reply = reply_text(response, EMPTY_REPLY_TEXT);
                self.history.push(Message::assistant(reply.clone()));
                Ok(self.resolve(slot, reply))
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Chat message failed");
                // Keep model turns alternating; the failed turn is only visible
                self.history.pop();
                self.resolve(slot, CHAT_ERROR_TEXT.to_string());
                Err(e.into())
            }
        }
    }

    async fn call(&self, chunk_tx: Option<mpsc::Sender<StreamChunk>>) -> Result<CompletionResponse, LlmError> {
        let request = CompletionRequest::new(self.system_instruction.clone(), self.history.clone(), self.max_tokens);
        let response = match chunk_tx {
            Some(tx) => self.llm.stream(request, tx).await?,
            None => self.llm.complete(request).await?,
        };
        debug!(total_tokens = response.usage.total(), "call: response received");
        Ok(response)
    }

    fn push_placeholder(&mut self) -> usize {
        self.transcript.push(ChatMessage::loading());
        self.transcript.len() - 1
    }

    fn resolve(&mut self, slot: usize, text: String) -> ChatMessage {
        let message = &mut self.transcript[slot];
        message.text = text;
        message.is_loading = false;
        message.clone()
    }
}

fn reply_text(response: CompletionResponse, fallback: &str) -> String {
    response
        .content
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BrandType, ChatRole};
    use crate::llm::Role;
    use crate::llm::mock::{MockLlmClient, MockReply};

    fn profile(platform: Platform) -> Profile {
        let mut p = Profile::new("Ada", BrandType::Personal, platform);
        p.persona = "Calm".to_string();
        p.visual_style = "Film grain".to_string();
        p.set_posting_days([1]).unwrap();
        p.add_pillar("Tutorials", "step-by-step");
        p
    }

    fn session(replies: Vec<MockReply>) -> (Arc<MockLlmClient>, ChatSession) {
        let mock = Arc::new(MockLlmClient::new(replies));
        let session = ChatSession::open(
            mock.clone(),
            &PromptLoader::embedded_only(),
            &profile(Platform::YouTube),
            "Knife Skills",
            "Three cuts in sixty seconds.",
        )
        .unwrap();
        (mock, session)
    }

    #[tokio::test]
    async fn test_bootstrap_is_first_visible_message() {
        let (mock, mut session) = session(vec![MockReply::text("Hi, I'm your assistant.")]);

        let greeting = session.bootstrap().await.unwrap();

        assert_eq!(greeting.role, ChatRole::Model);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].text, "Hi, I'm your assistant.");
        assert!(!session.transcript()[0].is_loading);

        let sent = &mock.requests()[0];
        assert_eq!(sent.messages, vec![Message::user(BOOTSTRAP_PROMPT)]);
    }

    #[tokio::test]
    async fn test_system_instruction_fixed_across_turns() {
        let (mock, mut session) = session(vec![
            MockReply::text("Hello"),
            MockReply::text("Angle 1"),
            MockReply::text("Outline"),
        ]);
        let system = session.system_instruction().to_string();
        assert!(system.contains("Theme: Knife Skills"));

        session.bootstrap().await.unwrap();
        session.send("Give me ideas").await.unwrap();
        session.send("Now an outline").await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.system_prompt == system));

        // Full history is resent, alternating and ending on the user turn
        let last = &requests[2].messages;
        assert_eq!(last.len(), 5);
        assert_eq!(last[0].content, BOOTSTRAP_PROMPT);
        assert_eq!(last[3].role, Role::User);
        assert_eq!(last[4].content, "Now an outline");

        let roles: Vec<_> = session.transcript().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [ChatRole::Model, ChatRole::User, ChatRole::Model, ChatRole::User, ChatRole::Model]
        );
    }

    #[tokio::test]
    async fn test_send_failure_shows_error_text() {
        let (mock, mut session) = session(vec![MockReply::text("Hello"), MockReply::fail("down"), MockReply::text("Back")]);
        session.bootstrap().await.unwrap();

        let err = session.send("Title ideas?").await.unwrap_err();
        assert!(matches!(err, ChatError::Remote(_)));

        let transcript = session.transcript();
        assert_eq!(transcript[1].text, "Title ideas?");
        assert_eq!(transcript[2].text, CHAT_ERROR_TEXT);
        assert!(!transcript[2].is_loading);

        // The failed turn is not resent
        session.send("Try again").await.unwrap();
        let resent = &mock.requests()[2].messages;
        assert_eq!(resent.len(), 3);
        assert_eq!(resent[2].content, "Try again");
    }

    #[tokio::test]
    async fn test_bootstrap_failure_leaves_transcript_empty() {
        let (_, mut session) = session(vec![MockReply::fail("down")]);
        assert!(session.bootstrap().await.is_err());
        assert!(session.transcript().is_empty());
        assert!(matches!(session.bootstrap().await, Err(ChatError::AlreadyBootstrapped)));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (mock, mut session) = session(vec![]);
        assert!(matches!(session.send("   ").await, Err(ChatError::EmptyMessage)));
        assert!(session.transcript().is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_reply_uses_fallback_text() {
        let (_, mut session) = session(vec![MockReply::text(""), MockReply::text(" ")]);
        assert_eq!(session.bootstrap().await.unwrap().text, EMPTY_GREETING_TEXT);
        assert_eq!(session.send("hi").await.unwrap().text, EMPTY_REPLY_TEXT);
    }

    #[tokio::test]
    async fn test_send_streaming_forwards_deltas() {
        let (_, mut session) = session(vec![MockReply::text("Hello"), MockReply::text("Streamed reply")]);
        session.bootstrap().await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let reply = session.send_streaming("Brainstorm", tx).await.unwrap();
        assert_eq!(reply.text, "Streamed reply");

        match rx.recv().await {
            Some(StreamChunk::TextDelta(text)) => assert_eq!(text, "Streamed reply"),
            other => panic!("Expected TextDelta, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_presets_follow_platform() {
        let mock = Arc::new(MockLlmClient::new(vec![]));
        let session = ChatSession::open(
            mock,
            &PromptLoader::embedded_only(),
            &profile(Platform::Instagram),
            "t",
            "d",
        )
        .unwrap();
        assert_eq!(session.presets()[1].label, "Reel Script");
        assert!(session.system_instruction().contains("Visual Hook, Audio cue, Caption"));
    }
}
