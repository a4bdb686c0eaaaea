//! Store location settings for `ks`
//!
//! Resolution order: explicit `--config` file, `$XDG_CONFIG_HOME/keystore/config.yml`,
//! `./keystore.yml`, then built-in defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one file per key
    #[serde(default = "default_store_path", rename = "store-path")]
    pub store_path: PathBuf,
}

/// `<data_local_dir>/cadence/store`, shared with the cadence binary
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadence")
        .join("store")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(explicit) => Self::from_file(explicit),
            None => Self::candidates()
                .into_iter()
                .find(|candidate| candidate.exists())
                .map(|found| Self::from_file(&found))
                .unwrap_or_else(|| Ok(Self::default())),
        }
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("keystore").join("config.yml"));
        }
        paths.push(PathBuf::from("keystore.yml"));
        paths
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_yaml::to_string(self)?)
            .with_context(|| format!("Failed to write config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_file_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("keystore.yml");

        let config = Config {
            store_path: PathBuf::from("/tmp/somewhere"),
        };
        config.save(&path).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_empty_document_uses_default_path() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(Some(&temp.path().join("nope.yml"))).unwrap_err();
        assert!(err.to_string().contains("nope.yml"));
    }
}
