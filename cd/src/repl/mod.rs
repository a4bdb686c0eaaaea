//! Interactive chat REPL
//!
//! Streams replies to the terminal and offers slash commands for the
//! platform's preset prompts.

mod session;

pub use session::ReplSession;

use eyre::{Context, Result};

use crate::chat::ChatSession;
use crate::config::Config;
use crate::domain::{DayPlan, Profile};
use crate::llm::create_client;
use crate::prompts::PromptLoader;

/// Run the chat REPL for one day
///
/// This is the main entry point for `cadence chat`.
pub async fn run_chat(config: &Config, profile: &Profile, day: DayPlan) -> Result<()> {
    config.validate()?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let prompts = PromptLoader::new(config.prompts.override_dir.as_deref());
    let chat = ChatSession::open(llm, &prompts, profile, &day.theme, &day.description)
        .context("Failed to open chat session")?
        .with_max_tokens(config.llm.max_tokens);

    let mut session = ReplSession::new(chat, day);
    session.run().await
}
