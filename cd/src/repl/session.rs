//! REPL session management

use std::io::{self, Write};

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::debug;

use crate::chat::{ChatError, ChatSession, find_preset};
use crate::domain::{ChatMessage, ChatRole, DayPlan};
use crate::llm::StreamChunk;

/// Interactive chat for one day
pub struct ReplSession {
    chat: ChatSession,
    day: DayPlan,
}

impl ReplSession {
    pub fn new(chat: ChatSession, day: DayPlan) -> Self {
        Self { chat, day }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let (tx, print_handle) = spawn_printer();
        match self.chat.bootstrap_streaming(tx).await {
            Ok(_) => {
                let _ = print_handle.await;
                println!();
                println!();
            }
            Err(e) => {
                let _ = print_handle.await;
                println!("{} {}", "Assistant unavailable:".yellow(), e);
                println!();
            }
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.send(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{} {}", self.day.date.format("%A %b %d").to_string().bright_cyan().bold(), self.day.theme.bold());
        println!("{}", self.day.description.dimmed());
        if let Some(pillar) = &self.day.pillar {
            println!("Pillar: {}", pillar.bright_white());
        }
        println!("Type {} for shortcuts, {} for help, {} to quit", "/presets".yellow(), "/help".yellow(), "/quit".yellow());
        println!();
    }

    /// Send text and stream the reply to stdout
    async fn send(&mut self, text: &str) {
        let (tx, print_handle) = spawn_printer();
        let result = self.chat.send_streaming(text, tx).await;
        let _ = print_handle.await;

        match result {
            Ok(_) => println!(),
            Err(ChatError::Remote(e)) => {
                debug!(error = %e, "send: remote failure");
                println!("{}", crate::chat::CHAT_ERROR_TEXT.red());
            }
            Err(e) => println!("{} {}", "!".yellow(), e),
        }
        println!();
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        match parse_slash(input) {
            SlashCommand::Help => {
                self.print_help();
                SlashResult::Continue
            }
            SlashCommand::Quit => SlashResult::Quit,
            SlashCommand::Presets => {
                self.print_presets();
                SlashResult::Continue
            }
            SlashCommand::Preset(selector) => {
                match find_preset(self.chat.platform(), &selector) {
                    Some(preset) => {
                        println!("{} {}", ">".bright_green(), preset.prompt);
                        self.send(preset.prompt).await;
                    }
                    None => println!("{} Unknown preset: {}", "?".yellow(), selector),
                }
                SlashResult::Continue
            }
            SlashCommand::History => {
                print_history(self.chat.transcript());
                SlashResult::Continue
            }
            SlashCommand::Unknown(cmd) => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the chat", "/quit".yellow());
        println!("  {:14} List shortcut prompts", "/presets".yellow());
        println!("  {:14} Send shortcut N (or by label)", "/preset N".yellow());
        println!("  {:14} Show the conversation so far", "/history".yellow());
        println!();
    }

    fn print_presets(&self) {
        println!();
        println!("{}", "Shortcuts:".bright_cyan());
        for (i, preset) in self.chat.presets().iter().enumerate() {
            println!("  {}. {:20} {}", i + 1, preset.label.yellow(), preset.prompt.dimmed());
        }
        println!();
    }
}

fn print_history(transcript: &[ChatMessage]) {
    if transcript.is_empty() {
        println!("{}", "No conversation history.".dimmed());
        return;
    }

    println!();
    println!("{}", "Conversation History:".bright_cyan());
    for (i, msg) in transcript.iter().enumerate() {
        let role = match msg.role {
            ChatRole::User => "You".bright_green(),
            ChatRole::Model => "Assistant".bright_blue(),
        };
        let preview: String = msg.text.chars().take(60).collect();
        let preview = if msg.text.chars().count() > 60 { format!("{}...", preview) } else { preview };
        println!("  {}. {}: {}", i + 1, role, preview);
    }
    println!();
}

/// Print streamed text as it arrives
fn spawn_printer() -> (mpsc::Sender<StreamChunk>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<StreamChunk>(100);
    let handle = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            match chunk {
                StreamChunk::TextDelta(text) => {
                    print!("{}", text);
                    let _ = io::stdout().flush();
                }
                StreamChunk::MessageDone { .. } => {}
                StreamChunk::Error(err) => {
                    eprintln!("\n{} {}", "Stream error:".red(), err);
                }
            }
        }
    });
    (tx, handle)
}

#[derive(Debug, PartialEq, Eq)]
enum SlashCommand {
    Help,
    Quit,
    Presets,
    Preset(String),
    History,
    Unknown(String),
}

fn parse_slash(input: &str) -> SlashCommand {
    let mut parts = input.trim().splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).unwrap_or("");

    match cmd {
        "/help" | "/h" => SlashCommand::Help,
        "/quit" | "/q" | "/exit" => SlashCommand::Quit,
        "/presets" | "/p" => SlashCommand::Presets,
        "/preset" if !arg.is_empty() => SlashCommand::Preset(arg.to_string()),
        "/preset" => SlashCommand::Presets,
        "/history" => SlashCommand::History,
        other => SlashCommand::Unknown(other.to_string()),
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slash() {
        assert_eq!(parse_slash("/help"), SlashCommand::Help);
        assert_eq!(parse_slash("/q"), SlashCommand::Quit);
        assert_eq!(parse_slash("/presets"), SlashCommand::Presets);
        assert_eq!(parse_slash("/preset"), SlashCommand::Presets);
        assert_eq!(parse_slash("/preset 2"), SlashCommand::Preset("2".to_string()));
        assert_eq!(
            parse_slash("/preset Caption & Hashtags"),
            SlashCommand::Preset("Caption & Hashtags".to_string())
        );
        assert_eq!(parse_slash("/history"), SlashCommand::History);
        assert_eq!(parse_slash("/clear"), SlashCommand::Unknown("/clear".to_string()));
    }
}
