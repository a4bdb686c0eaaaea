//! AI week plan generation
//!
//! `PlanGenerator::generate_week` never fails: every remote or parse
//! failure is logged and collapses into a degraded week of sentinel plans.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{DAYS_PER_WEEK, DayPlan, Profile, WeekPlans, anchor_sunday, week_dates};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::PromptLoader;
use crate::store::{PlanStore, StoreError};

mod response;

pub use response::{PlanEntry, SUBMIT_TOOL, parse_plans, submit_tool};

/// Default token ceiling for a week plan reply
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Why a generation fell back to sentinels
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Remote call failed: {0}")]
    Remote(#[from] LlmError),

    #[error("Malformed plan response: {0}")]
    Malformed(String),

    #[error("Empty plan response")]
    Empty,

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

/// Builds the 7 day plans for a week from a profile
pub struct PlanGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        Self {
            llm,
            prompts,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Generate the week containing `date`
    ///
    /// Always returns exactly 7 plans, Sunday through Saturday.
    pub async fn generate_week(&self, profile: &Profile, date: NaiveDate) -> WeekPlans {
        let week_start = anchor_sunday(date);
        debug!(%date, %week_start, "generate_week: called");

        match self.request_plans(profile, week_start).await {
            Ok(entries) => {
                let week = merge(week_start, &entries);
                info!(
                    %week_start,
                    entries = entries.len(),
                    provenance = %week.provenance,
                    "Generated week plan"
                );
                week
            }
            Err(e) => {
                let retryable = matches!(&e, GenerationError::Remote(inner) if inner.is_retryable());
                warn!(%week_start, error = %e, retryable, "Week generation failed, using rest-day plans");
                WeekPlans::degraded(week_start)
            }
        }
    }

    /// Generate the week containing `date` and replace the stored week with it
    pub async fn generate_and_store(
        &self,
        profile: &Profile,
        date: NaiveDate,
        plans: &PlanStore,
    ) -> Result<WeekPlans, StoreError> {
        let week = self.generate_week(profile, date).await;
        plans.save(&week)?;
        Ok(week)
    }

    async fn request_plans(&self, profile: &Profile, week_start: NaiveDate) -> Result<Vec<PlanEntry>, GenerationError> {
        let system = self
            .prompts
            .week_plan_system()
            .map_err(|e| GenerationError::Prompt(e.to_string()))?;
        let brief = self
            .prompts
            .week_plan(profile, week_start)
            .map_err(|e| GenerationError::Prompt(e.to_string()))?;

        let request =
            CompletionRequest::new(system, vec![Message::user(brief)], self.max_tokens).with_forced_tool(submit_tool());
        let response = self.llm.complete(request).await?;
        debug!(
            stop_reason = ?response.stop_reason,
            total_tokens = response.usage.total(),
            "request_plans: response received"
        );
        parse_plans(&response)
    }
}

/// Fit model entries onto the fixed 7-date skeleton
///
/// The first entry for an offset wins. Offsets outside 0..7 are ignored and
/// uncovered slots get the sentinel plan.
pub fn merge(week_start: NaiveDate, entries: &[PlanEntry]) -> WeekPlans {
    let days = week_dates(week_start)
        .into_iter()
        .enumerate()
        .map(|(offset, date)| {
            match entries.iter().find(|e| e.day_offset == offset as i64) {
                Some(entry) => {
                    let pillar = entry
                        .pillar
                        .as_deref()
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string);
                    DayPlan::generated(date, entry.theme.clone(), entry.description.clone(), pillar)
                }
                None => DayPlan::sentinel(date),
            }
        })
        .collect::<Vec<_>>();
    debug_assert_eq!(days.len(), DAYS_PER_WEEK);
    WeekPlans::from_days(anchor_sunday(week_start), days)
}
