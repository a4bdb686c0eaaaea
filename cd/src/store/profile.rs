//! Profile persistence

use std::sync::Arc;

use keystore::KeyValueStore;

use super::record::JsonRecord;
use super::{CorruptPolicy, StoreError};
use crate::domain::Profile;

/// Key the brand profile is stored under
pub const PROFILE_KEY: &str = "mono_user";

/// Reads and writes the brand profile
pub struct ProfileStore {
    record: JsonRecord,
}

impl ProfileStore {
    /// Store with the default `Surface` policy
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_policy(kv, CorruptPolicy::default())
    }

    pub fn with_policy(kv: Arc<dyn KeyValueStore>, policy: CorruptPolicy) -> Self {
        Self {
            record: JsonRecord::new(kv, PROFILE_KEY, policy),
        }
    }

    pub fn load(&self) -> Result<Option<Profile>, StoreError> {
        self.record.load()
    }

    /// Replace the stored profile wholesale
    pub fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        self.record.save(profile)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.record.clear()
    }

    /// Load the profile only if onboarding was completed
    pub fn load_onboarded(&self) -> Result<Option<Profile>, StoreError> {
        Ok(self.load()?.filter(|p| p.is_onboarded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BrandType, Platform};
    use keystore::MemoryStore;

    fn onboarded() -> Profile {
        let mut p = Profile::new("Ada", BrandType::Company, Platform::Instagram);
        p.persona = "Bold".to_string();
        p.visual_style = "Neon".to_string();
        p.set_posting_days([0, 6]).unwrap();
        p.add_pillar("Reels", "");
        p.complete_onboarding().unwrap();
        p
    }

    #[test]
    fn test_load_absent() {
        let store = ProfileStore::new(Arc::new(MemoryStore::new()));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let kv = Arc::new(MemoryStore::new());
        let store = ProfileStore::new(kv.clone());
        let profile = onboarded();

        store.save(&profile).unwrap();
        assert_eq!(store.load().unwrap(), Some(profile));
        assert!(kv.get(PROFILE_KEY).unwrap().unwrap().contains("\"isOnboarded\":true"));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_onboarded_filters_incomplete() {
        let store = ProfileStore::new(Arc::new(MemoryStore::new()));
        store
            .save(&Profile::new("Draft", BrandType::Personal, Platform::YouTube))
            .unwrap();
        assert!(store.load().unwrap().is_some());
        assert!(store.load_onboarded().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_profile_surfaces_by_default() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(PROFILE_KEY, "{not json").unwrap();
        let store = ProfileStore::new(kv);

        match store.load() {
            Err(StoreError::CorruptState { key, .. }) => assert_eq!(key, PROFILE_KEY),
            other => panic!("Expected CorruptState, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_profile_discard_policy() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(PROFILE_KEY, "[1, 2, 3]").unwrap();
        let store = ProfileStore::with_policy(kv, CorruptPolicy::Discard);
        assert!(store.load().unwrap().is_none());
    }
}
