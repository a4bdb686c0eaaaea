//! Cadence - AI content calendar for creators
//!
//! A creator onboards with a brand profile (platform, persona, posting
//! days, content pillars), gets a generated week of day plans, and chats
//! with an assistant scoped to one day's theme.
//!
//! # Modules
//!
//! - [`domain`] - Profile, day plans, weeks and chat messages
//! - [`store`] - Profile and plan persistence over a key-value store
//! - [`llm`] - LLM client trait, Anthropic/OpenAI implementations, mock
//! - [`prompts`] - Handlebars prompt templates
//! - [`planner`] - Week generation with per-day fallback
//! - [`chat`] - Day-scoped chat sessions and preset prompts
//! - [`repl`] - Interactive chat front end
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod chat;
pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod repl;
pub mod store;

pub use chat::{ChatError, ChatSession};
pub use config::Config;
pub use domain::{DayPlan, Profile, WeekPlans};
pub use planner::PlanGenerator;
pub use store::{PlanStore, ProfileStore, StoreError};
