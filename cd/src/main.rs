//! Cadence - AI content calendar for creators
//!
//! CLI entry point for onboarding, weekly planning and day chat.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, bail, eyre};
use tracing::{debug, info};

use cadence::chat::presets_for;
use cadence::cli::{Cli, Command, DayCommand, PillarCommand, ProfileCommand, ProfileUpdate};
use cadence::config::Config;
use cadence::domain::{BrandType, ContentPillar, DayPlan, Platform, Profile, WeekPlans, WeekProvenance, weekday_name};
use cadence::llm::create_client;
use cadence::planner::PlanGenerator;
use cadence::prompts::PromptLoader;
use cadence::repl;
use cadence::store::{CorruptPolicy, PlanStore, ProfileStore, reset};
use keystore::{FileStore, KeyValueStore};

const NOT_ONBOARDED: &str = "Profile not onboarded. Run `cadence onboard` to get started.";

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadence")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("cadence.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Profile and plan stores over the configured data directory
struct Stores {
    profiles: ProfileStore,
    plans: PlanStore,
}

impl Stores {
    fn open(config: &Config) -> Result<Self> {
        debug!(data_dir = ?config.storage.data_dir, "Stores::open: called");
        let kv: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::open(&config.storage.data_dir)
                .with_context(|| format!("Failed to open store at {}", config.storage.data_dir.display()))?,
        );
        Ok(Self {
            profiles: ProfileStore::with_policy(kv.clone(), CorruptPolicy::Surface),
            // Plans can always be regenerated
            plans: PlanStore::with_policy(kv, CorruptPolicy::Discard),
        })
    }

    fn onboarded_profile(&self) -> Result<Profile> {
        self.profiles
            .load_onboarded()
            .context("Failed to load profile")?
            .ok_or_else(|| eyre!(NOT_ONBOARDED))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let stores = Stores::open(&config)?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Onboard {
            name,
            brand_type,
            platform,
            days,
            pillars,
            persona,
            visual_style,
            context,
        } => {
            let draft = OnboardDraft {
                name,
                brand_type,
                platform,
                days,
                pillars,
                persona,
                visual_style,
                context,
            };
            cmd_onboard(&stores, draft)
        }
        Command::Profile { command } => match command {
            ProfileCommand::Show => cmd_profile_show(&stores),
            ProfileCommand::Set(update) => cmd_profile_set(&stores, update),
        },
        Command::Pillar { command } => cmd_pillar(&stores, command),
        Command::Week { date, regenerate } => cmd_week(&config, &stores, date.unwrap_or_else(today), regenerate).await,
        Command::Day { command } => cmd_day(&stores, command),
        Command::Chat { date } => cmd_chat(&config, &stores, date.unwrap_or_else(today)).await,
        Command::Presets => cmd_presets(&stores),
        Command::Reset { yes } => cmd_reset(&stores, yes),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

struct OnboardDraft {
    name: String,
    brand_type: BrandType,
    platform: Platform,
    days: Vec<u8>,
    pillars: Vec<ContentPillar>,
    persona: String,
    visual_style: String,
    context: Option<String>,
}

/// Create the profile
fn cmd_onboard(stores: &Stores, draft: OnboardDraft) -> Result<()> {
    debug!(name = %draft.name, "cmd_onboard: called");
    if stores.profiles.load_onboarded().context("Failed to load profile")?.is_some() {
        bail!("A profile already exists. Use `cadence profile set` to change it or `cadence reset --yes` to start over.");
    }

    let mut profile = Profile::new(draft.name.trim(), draft.brand_type, draft.platform);
    profile.persona = draft.persona.trim().to_string();
    profile.visual_style = draft.visual_style.trim().to_string();
    profile.additional_info = draft.context.unwrap_or_default().trim().to_string();
    profile.set_posting_days(draft.days)?;
    for pillar in draft.pillars {
        if !profile.add_pillar(pillar.name.clone(), pillar.description) {
            println!("{} Skipping duplicate pillar '{}'", "!".yellow(), pillar.name);
        }
    }
    profile.complete_onboarding()?;

    stores.profiles.save(&profile).context("Failed to save profile")?;
    info!(name = %profile.name, platform = %profile.platform, "Onboarding complete");

    println!("{} Welcome, {}!", "✓".green(), profile.name.bold());
    print_profile(&profile);
    println!("Run {} to plan your week.", "cadence week".yellow());
    Ok(())
}

fn cmd_profile_show(stores: &Stores) -> Result<()> {
    debug!("cmd_profile_show: called");
    match stores.profiles.load_onboarded().context("Failed to load profile")? {
        Some(profile) => print_profile(&profile),
        None => println!("{}", NOT_ONBOARDED),
    }
    Ok(())
}

/// Apply settings changes; the result must still be a complete profile
fn cmd_profile_set(stores: &Stores, update: ProfileUpdate) -> Result<()> {
    debug!(?update, "cmd_profile_set: called");
    let mut profile = stores.onboarded_profile()?;

    if let Some(name) = update.name {
        profile.name = name.trim().to_string();
    }
    if let Some(brand_type) = update.brand_type {
        profile.brand_type = brand_type;
    }
    if let Some(platform) = update.platform {
        profile.platform = platform;
    }
    if let Some(days) = update.days {
        profile.set_posting_days(days)?;
    }
    if let Some(persona) = update.persona {
        profile.persona = persona.trim().to_string();
    }
    if let Some(visual_style) = update.visual_style {
        profile.visual_style = visual_style.trim().to_string();
    }
    if let Some(context) = update.context {
        profile.additional_info = context.trim().to_string();
    }

    profile.validate()?;
    stores.profiles.save(&profile).context("Failed to save profile")?;
    println!("{} Profile updated", "✓".green());
    print_profile(&profile);
    Ok(())
}

fn cmd_pillar(stores: &Stores, command: PillarCommand) -> Result<()> {
    debug!(?command, "cmd_pillar: called");
    let mut profile = stores.onboarded_profile()?;

    match command {
        PillarCommand::List => {
            print_pillars(&profile);
            return Ok(());
        }
        PillarCommand::Add { name, description } => {
            if !profile.add_pillar(name.clone(), description) {
                bail!("Pillar '{}' already exists or has an empty name", name.trim());
            }
        }
        PillarCommand::Edit {
            position,
            name,
            description,
        } => {
            let index = position.checked_sub(1).ok_or_else(|| eyre!("Positions start at 1"))?;
            let current = profile
                .content_pillars
                .get(index)
                .cloned()
                .ok_or_else(|| eyre!("No pillar at position {}", position))?;
            let name = name.unwrap_or(current.name);
            let description = description.unwrap_or(current.description);
            if !profile.edit_pillar(index, name.clone(), description) {
                bail!("Pillar '{}' already exists or has an empty name", name.trim());
            }
        }
        PillarCommand::Rm { name } => {
            if !profile.remove_pillar(&name) {
                bail!("No pillar named '{}'", name);
            }
        }
    }

    profile.validate()?;
    stores.profiles.save(&profile).context("Failed to save profile")?;
    print_pillars(&profile);
    Ok(())
}

/// Show the week containing `date`, generating it when not cached
async fn cmd_week(config: &Config, stores: &Stores, date: NaiveDate, regenerate: bool) -> Result<()> {
    debug!(%date, regenerate, "cmd_week: called");
    let profile = stores.onboarded_profile()?;

    if !regenerate && let Some(week) = stores.plans.load_week_of(date).context("Failed to load plans")? {
        debug!("cmd_week: using stored week");
        print_week(&profile, &week, date);
        return Ok(());
    }

    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let prompts = Arc::new(PromptLoader::new(config.prompts.override_dir.as_deref()));
    let generator = PlanGenerator::new(llm, prompts).with_max_tokens(config.llm.max_tokens);

    println!("{}", "Generating your week...".dimmed());
    let week = generator
        .generate_and_store(&profile, date, &stores.plans)
        .await
        .context("Failed to save plans")?;

    print_week(&profile, &week, date);
    Ok(())
}

fn cmd_day(stores: &Stores, command: DayCommand) -> Result<()> {
    debug!(?command, "cmd_day: called");
    let day = match command {
        DayCommand::Toggle { date } => stores.plans.toggle_posted(date)?,
        DayCommand::Edit {
            date,
            theme,
            description,
        } => {
            if theme.is_none() && description.is_none() {
                bail!("Nothing to change. Pass --theme and/or --description.");
            }
            stores.plans.update_day(date, |day| {
                day.edit(theme, description);
            })?
        }
    };

    print_day(&day, None);
    Ok(())
}

async fn cmd_chat(config: &Config, stores: &Stores, date: NaiveDate) -> Result<()> {
    debug!(%date, "cmd_chat: called");
    let profile = stores.onboarded_profile()?;
    let day = stores
        .plans
        .load_week_of(date)
        .context("Failed to load plans")?
        .and_then(|week| week.day(date).cloned())
        .ok_or_else(|| eyre!("No plan for {}. Run `cadence week --date {}` first.", date, date))?;

    repl::run_chat(config, &profile, day).await
}

fn cmd_presets(stores: &Stores) -> Result<()> {
    debug!("cmd_presets: called");
    let profile = stores.onboarded_profile()?;
    println!("{}", format!("{} shortcuts:", profile.platform).bright_cyan());
    for (i, preset) in presets_for(profile.platform).iter().enumerate() {
        println!("  {}. {:20} {}", i + 1, preset.label.yellow(), preset.prompt.dimmed());
    }
    Ok(())
}

fn cmd_reset(stores: &Stores, yes: bool) -> Result<()> {
    debug!(yes, "cmd_reset: called");
    if !yes {
        bail!("This deletes your profile and plans. Re-run with --yes to confirm.");
    }
    reset(&stores.profiles, &stores.plans).context("Failed to reset")?;
    println!("{} Profile and plans removed", "✓".green());
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!();
    println!("{} ({} on {})", profile.name.bold(), profile.brand_type, profile.platform);
    println!("  {:14} {}", "Persona:".dimmed(), profile.persona);
    println!("  {:14} {}", "Visual style:".dimmed(), profile.visual_style);
    println!("  {:14} {}", "Posting days:".dimmed(), profile.active_weekday_names().join(", "));
    if !profile.additional_info.is_empty() {
        println!("  {:14} {}", "Context:".dimmed(), profile.additional_info);
    }
    print_pillars(profile);
}

fn print_pillars(profile: &Profile) {
    println!("  {}", "Pillars:".dimmed());
    for (i, pillar) in profile.content_pillars.iter().enumerate() {
        if pillar.description.is_empty() {
            println!("    {}. {}", i + 1, pillar.name);
        } else {
            println!("    {}. {} - {}", i + 1, pillar.name, pillar.description.dimmed());
        }
    }
    println!();
}

fn print_week(profile: &Profile, week: &WeekPlans, selected: NaiveDate) {
    println!();
    println!(
        "{} {}  ({}/{} posted)",
        "Week of".bright_cyan(),
        week.week_start.format("%b %d, %Y").to_string().bright_cyan().bold(),
        week.posted_count(),
        week.days.len()
    );
    if week.provenance == WeekProvenance::Degraded {
        println!(
            "{}",
            "The assistant could not be reached; showing rest days. Try `cadence week --regenerate`.".yellow()
        );
    }
    println!();
    for day in &week.days {
        print_day(day, Some((profile, day.date == selected)));
    }
    println!();
}

fn print_day(day: &DayPlan, context: Option<(&Profile, bool)>) {
    let weekday_index = day.date.weekday().num_days_from_sunday() as u8;
    let weekday = weekday_name(weekday_index).unwrap_or_default();
    let check = if day.is_posted { "[x]".green() } else { "[ ]".normal() };

    // ">" marks the requested date, "*" an active posting day
    let (marker, active) = match context {
        Some((profile, selected)) => (
            if selected { ">" } else { " " },
            if profile.posts_on(weekday_index) { "*" } else { " " },
        ),
        None => (" ", " "),
    };

    let theme = if day.is_sentinel() { day.theme.dimmed() } else { day.theme.bold() };
    let pillar = day.pillar.as_deref().map(|p| format!(" [{}]", p)).unwrap_or_default();

    println!(
        "{}{} {:9} {} {} {}{}",
        marker.bright_green(),
        active,
        weekday,
        day.date.format("%m-%d"),
        check,
        theme,
        pillar.cyan()
    );
    println!("      {}", day.description.dimmed());
}
