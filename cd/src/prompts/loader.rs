//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::Profile;

const NO_CONTEXT: &str = "None provided.";
const NO_PILLAR_DETAILS: &str = "No specific details.";

/// One pillar line in the planning brief
#[derive(Debug, Clone, Serialize)]
pub struct PillarLine {
    pub name: String,
    pub description: String,
}

/// Context for the `week-plan` template
#[derive(Debug, Clone, Serialize)]
pub struct WeekPlanContext {
    pub brand_type: String,
    pub platform: String,
    pub name: String,
    pub persona: String,
    pub visual_style: String,
    pub additional_info: String,
    pub active_days: String,
    pub pillars: Vec<PillarLine>,
    /// Long form, e.g. "Sun Mar 03 2024"
    pub start_date: String,
    pub start_date_iso: String,
}

impl WeekPlanContext {
    pub fn new(profile: &Profile, week_start: NaiveDate) -> Self {
        let pillars = profile
            .content_pillars
            .iter()
            .map(|p| PillarLine {
                name: p.name.clone(),
                description: non_blank_or(&p.description, NO_PILLAR_DETAILS),
            })
            .collect();

        Self {
            brand_type: profile.brand_type.to_string(),
            platform: profile.platform.to_string(),
            name: profile.name.clone(),
            persona: profile.persona.clone(),
            visual_style: profile.visual_style.clone(),
            additional_info: non_blank_or(&profile.additional_info, NO_CONTEXT),
            active_days: profile.active_weekday_names().join(", "),
            pillars,
            start_date: week_start.format("%a %b %d %Y").to_string(),
            start_date_iso: week_start.to_string(),
        }
    }
}

/// Context for the `chat-system` template
#[derive(Debug, Clone, Serialize)]
pub struct ChatContext {
    pub brand_type: String,
    pub platform: String,
    pub name: String,
    pub persona: String,
    pub visual_style: String,
    pub additional_info: String,
    /// Pillars as "Name (description)", comma separated
    pub formats: String,
    pub day_theme: String,
    pub day_description: String,
    pub script_format: String,
}

impl ChatContext {
    pub fn new(profile: &Profile, day_theme: &str, day_description: &str) -> Self {
        let formats = profile
            .content_pillars
            .iter()
            .map(|p| {
                if p.description.trim().is_empty() {
                    p.name.clone()
                } else {
                    format!("{} ({})", p.name, p.description)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            brand_type: profile.brand_type.to_string(),
            platform: profile.platform.to_string(),
            name: profile.name.clone(),
            persona: profile.persona.clone(),
            visual_style: profile.visual_style.clone(),
            additional_info: non_blank_or(&profile.additional_info, NO_CONTEXT),
            formats,
            day_theme: day_theme.to_string(),
            day_description: day_description.to_string(),
            script_format: profile.platform.script_format().to_string(),
        }
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (`prompts.override-dir`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `override_dir` before the embedded prompts
    ///
    /// A directory that does not exist is ignored.
    pub fn new(override_dir: Option<&Path>) -> Self {
        let override_dir = override_dir.filter(|d| d.is_dir()).map(Path::to_path_buf);
        debug!(?override_dir, "PromptLoader::new: called");
        Self {
            hbs: Self::engine(),
            override_dir,
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    // Prompts are plain text, so HTML escaping is off
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{override_dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from user override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Planning brief for one week
    pub fn week_plan(&self, profile: &Profile, week_start: NaiveDate) -> Result<String> {
        self.render("week-plan", &WeekPlanContext::new(profile, week_start))
    }

    /// System prompt for week generation
    pub fn week_plan_system(&self) -> Result<String> {
        self.load_template("week-plan-system")
    }

    /// System instruction for a chat scoped to one day
    pub fn chat_system(&self, profile: &Profile, day_theme: &str, day_description: &str) -> Result<String> {
        self.render("chat-system", &ChatContext::new(profile, day_theme, day_description))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BrandType, Platform};
    use tempfile::TempDir;

    fn profile() -> Profile {
        let mut p = Profile::new("Ada Bakes", BrandType::Personal, Platform::YouTube);
        p.persona = "Warm & nerdy".to_string();
        p.visual_style = "Pastel, soft light".to_string();
        p.set_posting_days([1, 3]).unwrap();
        p.add_pillar("Tutorial", "Step-by-step <recipes>");
        p.add_pillar("Vlog", "");
        p
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_plan_brief_contents() {
        let loader = PromptLoader::embedded_only();
        let brief = loader.week_plan(&profile(), date("2024-03-03")).unwrap();

        assert!(brief.contains("Personal brand on YouTube"));
        assert!(brief.contains("- Name: Ada Bakes"));
        assert!(brief.contains("Active Days: Monday, Wednesday"));
        assert!(brief.contains("None provided."));
        assert!(brief.contains("- Tutorial: Step-by-step <recipes>"));
        assert!(brief.contains("- Vlog: No specific details."));
        assert!(brief.contains("Sun Mar 03 2024 (2024-03-03)"));
        // No HTML escaping
        assert!(brief.contains("Warm & nerdy"));
    }

    #[test]
    fn test_week_plan_brief_uses_additional_info() {
        let mut p = profile();
        p.additional_info = "Season 2 of the sourdough series".to_string();
        let brief = PromptLoader::embedded_only().week_plan(&p, date("2024-03-03")).unwrap();
        assert!(brief.contains("Season 2 of the sourdough series"));
        assert!(!brief.contains("None provided."));
    }

    #[test]
    fn test_chat_system_contents() {
        let loader = PromptLoader::embedded_only();
        let system = loader.chat_system(&profile(), "Knife Skills", "Three cuts in sixty seconds.").unwrap();

        assert!(system.contains("Theme: Knife Skills"));
        assert!(system.contains("Context: Three cuts in sixty seconds."));
        assert!(system.contains("Tutorial (Step-by-step <recipes>), Vlog"));
        assert!(system.contains("Hook, Intro, Value Props, CTA"));
    }

    #[test]
    fn test_chat_system_instagram_hint() {
        let mut p = profile();
        p.platform = Platform::Instagram;
        let system = PromptLoader::embedded_only().chat_system(&p, "t", "d").unwrap();
        assert!(system.contains("Visual Hook, Audio cue, Caption"));
    }

    #[test]
    fn test_override_dir_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("chat-system.pmt"), "Custom for {{name}} on {{day_theme}}").unwrap();

        let loader = PromptLoader::new(Some(dir.path()));
        let system = loader.chat_system(&profile(), "Knife Skills", "d").unwrap();
        assert_eq!(system, "Custom for Ada Bakes on Knife Skills");

        // Templates not overridden still come from the embedded set
        assert!(loader.week_plan_system().unwrap().contains("submit_week_plan"));
    }

    #[test]
    fn test_missing_override_dir_is_ignored() {
        let loader = PromptLoader::new(Some(Path::new("/nonexistent/cadence/prompts")));
        assert!(loader.week_plan(&profile(), date("2024-03-03")).is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
