//! Anchor-week arithmetic
//!
//! Weeks run Sunday through Saturday. Weekday indices follow the same
//! convention everywhere in the crate: 0 = Sunday .. 6 = Saturday.

use chrono::{Datelike, Days, NaiveDate};

/// Number of slots in a generated week
pub const DAYS_PER_WEEK: usize = 7;

/// Weekday names indexed by `num_days_from_sunday`
pub const WEEKDAY_NAMES: [&str; DAYS_PER_WEEK] =
    ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

/// Name for a weekday index, `None` when the index is out of range
pub fn weekday_name(index: u8) -> Option<&'static str> {
    WEEKDAY_NAMES.get(index as usize).copied()
}

/// Sunday of the week containing `date`
pub fn anchor_sunday(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday();
    date - Days::new(u64::from(offset))
}

/// The 7 calendar dates (Sunday..Saturday) of the week containing `date`
pub fn week_dates(date: NaiveDate) -> [NaiveDate; DAYS_PER_WEEK] {
    let start = anchor_sunday(date);
    std::array::from_fn(|offset| start + Days::new(offset as u64))
}
