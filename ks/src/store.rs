//! Core KeyValueStore implementations

use eyre::{Context, Result, eyre};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::VALUE_EXTENSION;

/// Durable string storage addressed by key
///
/// `set` is a whole-value replacement. Implementations must never leave a
/// half-written value visible to a later `get`.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key` (no-op if absent)
    fn remove(&self, key: &str) -> Result<()>;

    /// List all keys currently holding a value, sorted
    fn keys(&self) -> Result<Vec<String>>;
}

/// Check that a key is usable as a file stem
///
/// Keys are limited to ASCII alphanumerics, `_`, `-` and `.`, must not be
/// empty and must not start with a dot.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Key must not be empty"));
    }
    if key.starts_with('.') {
        return Err(eyre!("Key must not start with '.': {}", key));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        return Err(eyre!("Key contains invalid characters: {}", key));
    }
    Ok(())
}

/// File-backed store, one file per key
pub struct FileStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl FileStore {
    /// Open or create a store at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(?base_path, "Opened key store");
        Ok(Self { base_path })
    }

    /// Directory this store writes into
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", key, VALUE_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!(".{}.{}.tmp", key, VALUE_EXTENSION))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.value_path(key);
        if !path.exists() {
            debug!(key, "get: absent");
            return Ok(None);
        }
        let value = fs::read_to_string(&path).context(format!("Failed to read value: {}", path.display()))?;
        debug!(key, len = value.len(), "get: found");
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let tmp = self.temp_path(key);
        let path = self.value_path(key);

        // Write to a sibling temp file, then rename over the target
        fs::write(&tmp, value).context(format!("Failed to write temp file: {}", tmp.display()))?;
        fs::rename(&tmp, &path).context(format!("Failed to replace value: {}", path.display()))?;

        debug!(key, len = value.len(), "set: stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.value_path(key);
        if path.exists() {
            fs::remove_file(&path).context(format!("Failed to remove value: {}", path.display()))?;
            info!(key, "Removed value");
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map(|e| e != VALUE_EXTENSION).unwrap_or(true) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && validate_key(stem).is_ok()
            {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values.lock().map_err(|_| eyre!("Memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
