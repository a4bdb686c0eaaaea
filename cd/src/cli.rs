//! CLI command definitions and subcommands

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{BrandType, ContentPillar, Platform};

/// Cadence - AI content calendar and chat assistant for creators
#[derive(Parser)]
#[command(
    name = "cadence",
    about = "Plan a week of content from your brand profile and chat through each day",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the brand profile
    Onboard {
        /// Creator or brand name
        #[arg(long)]
        name: String,

        /// personal or company
        #[arg(long, default_value = "personal")]
        brand_type: BrandType,

        /// youtube or instagram
        #[arg(long)]
        platform: Platform,

        /// Posting weekdays, 0=Sunday..6=Saturday (e.g. 1,3,5)
        #[arg(long, value_delimiter = ',', required = true)]
        days: Vec<u8>,

        /// Content pillar as "Name" or "Name:description" (repeatable)
        #[arg(long = "pillar", required = true)]
        pillars: Vec<ContentPillar>,

        /// Voice and personality
        #[arg(long)]
        persona: String,

        /// Colour grading, editing style, aesthetic
        #[arg(long)]
        visual_style: String,

        /// Ongoing series, sponsors, life updates
        #[arg(long)]
        context: Option<String>,
    },

    /// Show or change the brand profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Manage content pillars
    Pillar {
        #[command(subcommand)]
        command: PillarCommand,
    },

    /// Show the week's content calendar, generating it if needed
    Week {
        /// Any date inside the week (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Discard the stored week and generate a new one
        #[arg(short, long)]
        regenerate: bool,
    },

    /// Edit one day of the stored week
    Day {
        #[command(subcommand)]
        command: DayCommand,
    },

    /// Chat with the assistant about one day's theme
    Chat {
        /// Day to discuss (default: today)
        date: Option<NaiveDate>,
    },

    /// List the preset prompts for your platform
    Presets,

    /// Delete the profile and the stored week
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

/// Profile subcommands
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Print the stored profile
    Show,

    /// Update profile fields (settings)
    Set(ProfileUpdate),
}

/// Fields that can be changed after onboarding
#[derive(Debug, Default, Args)]
pub struct ProfileUpdate {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub brand_type: Option<BrandType>,

    #[arg(long)]
    pub platform: Option<Platform>,

    /// Posting weekdays, 0=Sunday..6=Saturday (e.g. 1,3,5)
    #[arg(long, value_delimiter = ',')]
    pub days: Option<Vec<u8>>,

    #[arg(long)]
    pub persona: Option<String>,

    #[arg(long)]
    pub visual_style: Option<String>,

    /// Additional context; pass "" to clear
    #[arg(long)]
    pub context: Option<String>,
}

/// Pillar subcommands
#[derive(Debug, Subcommand)]
pub enum PillarCommand {
    /// List pillars
    List,

    /// Add a pillar
    Add {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Rename or redescribe the pillar at a 1-based position
    Edit {
        position: usize,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove a pillar by name
    Rm { name: String },
}

/// Day subcommands
#[derive(Debug, Subcommand)]
pub enum DayCommand {
    /// Flip the posted flag
    Toggle { date: NaiveDate },

    /// Change the theme or description
    Edit {
        date: NaiveDate,

        #[arg(short, long)]
        theme: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_onboard() {
        let cli = Cli::try_parse_from([
            "cadence",
            "onboard",
            "--name",
            "Ada",
            "--platform",
            "yt",
            "--days",
            "1,3,5",
            "--pillar",
            "Tutorials:step-by-step",
            "--pillar",
            "Vlogs",
            "--persona",
            "Calm",
            "--visual-style",
            "Film",
        ])
        .unwrap();

        match cli.command {
            Command::Onboard {
                platform,
                days,
                pillars,
                brand_type,
                context,
                ..
            } => {
                assert_eq!(platform, Platform::YouTube);
                assert_eq!(brand_type, BrandType::Personal);
                assert_eq!(days, vec![1, 3, 5]);
                assert_eq!(pillars.len(), 2);
                assert_eq!(pillars[0].description, "step-by-step");
                assert!(context.is_none());
            }
            other => panic!("Expected Onboard, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_week_and_day() {
        let cli = Cli::try_parse_from(["cadence", "-l", "debug", "week", "--date", "2024-03-06", "--regenerate"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Week { regenerate: true, date: Some(_) }));

        let cli = Cli::try_parse_from(["cadence", "day", "edit", "2024-03-06", "--theme", "New"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Day {
                command: DayCommand::Edit { theme: Some(_), description: None, .. }
            }
        ));
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(Cli::try_parse_from(["cadence", "day", "toggle", "03/06/2024"]).is_err());
    }
}
