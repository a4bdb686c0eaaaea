//! Domain types for Cadence
//!
//! Plain records only: the brand profile, a week of day plans, and chat
//! messages. None of them hold references to each other; a day plan names
//! its pillar by string and is matched against the profile when needed.

mod message;
mod plan;
mod profile;
mod week;

pub use message::{ChatMessage, ChatRole};
pub use plan::{DayPlan, Provenance, SENTINEL_DESCRIPTION, SENTINEL_THEME, WeekPlans, WeekProvenance};
pub use profile::{BrandType, ContentPillar, Platform, Profile, ProfileError, ProfileIssue};
pub use week::{DAYS_PER_WEEK, WEEKDAY_NAMES, anchor_sunday, week_dates, weekday_name};
