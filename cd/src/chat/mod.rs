//! Day-scoped AI chat

mod presets;
mod session;

pub use presets::{Preset, find_preset, presets_for};
pub use session::{BOOTSTRAP_PROMPT, CHAT_ERROR_TEXT, ChatError, ChatSession, DEFAULT_MAX_TOKENS};
