//! Week plan persistence

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use keystore::KeyValueStore;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::record::JsonRecord;
use super::{CorruptPolicy, StoreError};
use crate::domain::{DAYS_PER_WEEK, DayPlan, Provenance, WeekPlans, anchor_sunday, week_dates};

/// Key the current week is stored under
pub const PLANS_KEY: &str = "mono_plans";

/// The plans record after shape checks
///
/// Accepts the current `{weekStart, days}` object and the older bare array
/// of days. Either way the result is exactly 7 consecutive days starting
/// on a Sunday; anything else fails to decode and is handled by the
/// store's corrupt-state policy. An empty legacy array means no week.
#[derive(Deserialize)]
#[serde(try_from = "Value")]
struct StoredWeek(Option<WeekPlans>);

impl TryFrom<Value> for StoredWeek {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let (week_start, days) = match value {
            Value::Array(items) if items.is_empty() => return Ok(Self(None)),
            Value::Array(items) => {
                let legacy: Vec<LegacyDay> =
                    serde_json::from_value(Value::Array(items)).map_err(|e| format!("legacy day plans: {e}"))?;
                let days: Vec<DayPlan> = legacy.into_iter().map(LegacyDay::into_plan).collect();
                (anchor_sunday(days[0].date), days)
            }
            Value::Object(map) => {
                let week: WeekPlans =
                    serde_json::from_value(Value::Object(map)).map_err(|e| format!("week plans: {e}"))?;
                (week.week_start, week.days)
            }
            _ => return Err("expected a week object or an array of day plans".to_string()),
        };

        check_shape(week_start, &days)?;
        // Week provenance is derived from the days rather than trusted
        Ok(Self(Some(WeekPlans::from_days(week_start, days))))
    }
}

fn check_shape(week_start: NaiveDate, days: &[DayPlan]) -> Result<(), String> {
    if anchor_sunday(week_start) != week_start {
        return Err(format!("week start {week_start} is not a Sunday"));
    }
    if days.len() != DAYS_PER_WEEK {
        return Err(format!("expected {DAYS_PER_WEEK} days, found {}", days.len()));
    }
    for (day, expected) in days.iter().zip(week_dates(week_start)) {
        if day.date != expected {
            return Err(format!("found {} where {expected} was expected", day.date));
        }
    }
    Ok(())
}

/// Day plan as the first release wrote it: no pillar, no provenance, and
/// the date as a full ISO timestamp taken in the user's local time
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyDay {
    #[serde(deserialize_with = "legacy_date")]
    date: NaiveDate,
    theme: String,
    description: String,
    #[serde(default)]
    is_posted: bool,
}

impl LegacyDay {
    fn into_plan(self) -> DayPlan {
        let mut plan = DayPlan::generated(self.date, self.theme, self.description, None);
        plan.is_posted = self.is_posted;
        if plan.is_sentinel() {
            plan.provenance = Provenance::Fallback;
        }
        plan
    }
}

fn legacy_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_legacy_date(&raw).ok_or_else(|| de::Error::custom(format!("unrecognised date '{raw}'")))
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp mapped back to its local calendar day
fn parse_legacy_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|instant| instant.with_timezone(&Local).date_naive())
    })
}

/// Reads and writes the current week of day plans
pub struct PlanStore {
    record: JsonRecord,
}

impl PlanStore {
    /// Store with the default `Surface` policy
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_policy(kv, CorruptPolicy::default())
    }

    pub fn with_policy(kv: Arc<dyn KeyValueStore>, policy: CorruptPolicy) -> Self {
        Self {
            record: JsonRecord::new(kv, PLANS_KEY, policy),
        }
    }

    pub fn load(&self) -> Result<Option<WeekPlans>, StoreError> {
        Ok(self.record.load::<StoredWeek>()?.and_then(|stored| stored.0))
    }

    /// Load the stored week only if it is the week containing `date`
    pub fn load_week_of(&self, date: NaiveDate) -> Result<Option<WeekPlans>, StoreError> {
        Ok(self.load()?.filter(|week| week.contains(date)))
    }

    /// Replace the whole stored week
    pub fn save(&self, week: &WeekPlans) -> Result<(), StoreError> {
        self.record.save(week)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.record.clear()
    }

    /// Apply `f` to the stored day matching `date` and persist the week
    ///
    /// Sibling days are written back unchanged.
    pub fn update_day<F>(&self, date: NaiveDate, f: F) -> Result<DayPlan, StoreError>
    where
        F: FnOnce(&mut DayPlan),
    {
        debug!(%date, key = self.record.key(), "update_day: called");
        let mut week = self.load()?.ok_or(StoreError::NoWeek)?;
        let day = week.day_mut(date).ok_or(StoreError::DayNotFound(date))?;
        f(day);
        let updated = day.clone();
        self.save(&WeekPlans::from_days(week.week_start, week.days))?;
        Ok(updated)
    }

    /// Flip the posted flag of one day, returning the updated plan
    pub fn toggle_posted(&self, date: NaiveDate) -> Result<DayPlan, StoreError> {
        self.update_day(date, |day| {
            day.toggle_posted();
        })
    }
}
