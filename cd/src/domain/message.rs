//! Chat transcript messages

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a visible chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One entry in a session's visible transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Identity token (UUID v7, so ids sort by creation)
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    #[serde(default)]
    pub is_loading: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text.into(), false)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Model, text.into(), false)
    }

    /// Placeholder shown while a reply is pending
    pub fn loading() -> Self {
        Self::new(ChatRole::Model, String::new(), true)
    }

    fn new(role: ChatRole, text: String, is_loading: bool) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            role,
            text,
            is_loading,
        }
    }
}
