//! Profile and plan persistence over a key-value store
//!
//! Both stores hold a single JSON record each and are injected with the
//! backing `KeyValueStore`. There is no versioning or migration; decoding
//! is structural only.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

mod plans;
mod profile;
mod record;

pub use plans::{PLANS_KEY, PlanStore};
pub use profile::{PROFILE_KEY, ProfileStore};

/// What to do when a stored record fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptPolicy {
    /// Return `StoreError::CorruptState`
    #[default]
    Surface,
    /// Log a warning and treat the record as absent
    Discard,
}

/// Errors from the profile and plan stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Stored record '{key}' is corrupt: {source}")]
    CorruptState {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to encode record '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No week plan is stored")]
    NoWeek,

    #[error("{0} is not part of the stored week")]
    DayNotFound(NaiveDate),
}

impl StoreError {
    pub(crate) fn backend(err: eyre::Report) -> Self {
        Self::Backend(format!("{err:#}"))
    }
}

/// Remove the profile and the stored week
pub fn reset(profiles: &ProfileStore, plans: &PlanStore) -> Result<(), StoreError> {
    info!("Resetting profile and plans");
    profiles.clear()?;
    plans.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BrandType, Platform, Profile, WeekPlans};
    use keystore::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    #[test]
    fn test_reset_removes_both_records() {
        let kv = Arc::new(MemoryStore::new());
        let profiles = ProfileStore::new(kv.clone());
        let plans = PlanStore::new(kv.clone());

        profiles
            .save(&Profile::new("Ada", BrandType::Personal, Platform::YouTube))
            .unwrap();
        plans
            .save(&WeekPlans::degraded(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()))
            .unwrap();
        assert_eq!(kv.keys().unwrap(), vec![PLANS_KEY.to_string(), PROFILE_KEY.to_string()]);

        reset(&profiles, &plans).unwrap();
        assert!(kv.keys().unwrap().is_empty());
    }

    #[test]
    fn test_reset_on_empty_store() {
        let kv = Arc::new(MemoryStore::new());
        assert!(reset(&ProfileStore::new(kv.clone()), &PlanStore::new(kv)).is_ok());
    }
}
