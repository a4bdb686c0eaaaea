//! One JSON record under one key

use std::sync::Arc;

use keystore::KeyValueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{CorruptPolicy, StoreError};

/// A single JSON-encoded value held in a key-value store
pub(crate) struct JsonRecord {
    kv: Arc<dyn KeyValueStore>,
    key: &'static str,
    policy: CorruptPolicy,
}

impl JsonRecord {
    pub(crate) fn new(kv: Arc<dyn KeyValueStore>, key: &'static str, policy: CorruptPolicy) -> Self {
        Self { kv, key, policy }
    }

    pub(crate) fn key(&self) -> &'static str {
        self.key
    }

    /// Decode the stored value, applying the corrupt-state policy
    pub(crate) fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        debug!(key = self.key, "JsonRecord::load: called");
        let Some(raw) = self.kv.get(self.key).map_err(StoreError::backend)? else {
            debug!(key = self.key, "JsonRecord::load: absent");
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(source) => match self.policy {
                CorruptPolicy::Surface => Err(StoreError::CorruptState {
                    key: self.key.to_string(),
                    source,
                }),
                CorruptPolicy::Discard => {
                    warn!(key = self.key, error = %source, "Discarding corrupt stored record");
                    Ok(None)
                }
            },
        }
    }

    /// Replace the stored value
    pub(crate) fn save<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        debug!(key = self.key, "JsonRecord::save: called");
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: self.key.to_string(),
            source,
        })?;
        self.kv.set(self.key, &raw).map_err(StoreError::backend)
    }

    pub(crate) fn clear(&self) -> Result<(), StoreError> {
        debug!(key = self.key, "JsonRecord::clear: called");
        self.kv.remove(self.key).map_err(StoreError::backend)
    }
}
