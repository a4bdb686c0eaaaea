//! Day plan and week plan domain types
//!
//! A week is always exactly 7 day plans, Sunday through Saturday. The date
//! is the identity key for single-day updates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::week::{anchor_sunday, week_dates};

/// Theme used for slots with no generated content
pub const SENTINEL_THEME: &str = "Rest Day";

/// Description used for slots with no generated content
pub const SENTINEL_DESCRIPTION: &str = "No content scheduled for today.";

/// Where a day's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Theme and description were produced by the model
    #[default]
    Generated,
    /// Sentinel rest-day plan substituted for a missing or failed slot
    Fallback,
    /// Theme or description rewritten by the user after generation
    Edited,
}

/// Whether a week came back from the model at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekProvenance {
    /// At least one slot was generated or written by the user
    #[default]
    Generated,
    /// Every slot is an untouched fallback (typically the remote call failed)
    Degraded,
}

impl std::fmt::Display for WeekProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// One calendar day's content assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// ISO date (`YYYY-MM-DD`)
    pub date: NaiveDate,

    /// Short title
    pub theme: String,

    /// One-sentence brief
    pub description: String,

    /// Pillar name, matched against the profile by exact string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pillar: Option<String>,

    #[serde(default)]
    pub is_posted: bool,

    #[serde(default)]
    pub provenance: Provenance,
}

impl DayPlan {
    /// A generated plan for `date`
    pub fn generated(
        date: NaiveDate,
        theme: impl Into<String>,
        description: impl Into<String>,
        pillar: Option<String>,
    ) -> Self {
        Self {
            date,
            theme: theme.into(),
            description: description.into(),
            pillar,
            is_posted: false,
            provenance: Provenance::Generated,
        }
    }

    /// The fixed rest-day plan for `date`
    pub fn sentinel(date: NaiveDate) -> Self {
        Self {
            date,
            theme: SENTINEL_THEME.to_string(),
            description: SENTINEL_DESCRIPTION.to_string(),
            pillar: None,
            is_posted: false,
            provenance: Provenance::Fallback,
        }
    }

    /// True when theme and description carry the sentinel values
    pub fn is_sentinel(&self) -> bool {
        self.theme == SENTINEL_THEME && self.description == SENTINEL_DESCRIPTION
    }

    /// Replace theme and/or description; any actual change marks the day `Edited`
    ///
    /// Returns whether anything changed.
    pub fn edit(&mut self, theme: Option<String>, description: Option<String>) -> bool {
        let mut changed = false;
        if let Some(theme) = theme.map(|t| t.trim().to_string())
            && theme != self.theme
        {
            self.theme = theme;
            changed = true;
        }
        if let Some(description) = description.map(|d| d.trim().to_string())
            && description != self.description
        {
            self.description = description;
            changed = true;
        }
        if changed {
            self.provenance = Provenance::Edited;
        }
        changed
    }

    /// Flip the posted flag, returning the new value
    pub fn toggle_posted(&mut self) -> bool {
        self.is_posted = !self.is_posted;
        self.is_posted
    }
}

/// The persisted current week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekPlans {
    /// Sunday the week starts on
    pub week_start: NaiveDate,

    /// Exactly 7 plans, Sunday..Saturday
    pub days: Vec<DayPlan>,

    #[serde(default)]
    pub provenance: WeekProvenance,
}

impl WeekPlans {
    /// Build a week from its day plans, deriving the week provenance
    pub fn from_days(week_start: NaiveDate, days: Vec<DayPlan>) -> Self {
        let provenance = if days.iter().any(|d| d.provenance != Provenance::Fallback) {
            WeekProvenance::Generated
        } else {
            WeekProvenance::Degraded
        };
        Self {
            week_start,
            days,
            provenance,
        }
    }

    /// A week of sentinel plans for the week containing `date`
    pub fn degraded(date: NaiveDate) -> Self {
        let days = week_dates(date).into_iter().map(DayPlan::sentinel).collect();
        Self {
            week_start: anchor_sunday(date),
            days,
            provenance: WeekProvenance::Degraded,
        }
    }

    /// Whether `date` falls inside this week
    pub fn contains(&self, date: NaiveDate) -> bool {
        anchor_sunday(date) == self.week_start
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayPlan> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DayPlan> {
        self.days.iter_mut().find(|d| d.date == date)
    }

    /// Number of days marked posted
    pub fn posted_count(&self) -> usize {
        self.days.iter().filter(|d| d.is_posted).count()
    }
}
