//! Cadence configuration types and loading

use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything read from `cadence.yml`; every section is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub prompts: PromptsConfig,

    /// TRACE, DEBUG, INFO, WARN or ERROR; `--log-level` wins
    pub log_level: Option<String>,
}

impl Config {
    /// Fail fast when the API key variable is missing
    ///
    /// Called before week generation and chat so a missing key is reported
    /// once instead of surfacing as a degraded week.
    pub fn validate(&self) -> Result<()> {
        self.llm
            .get_api_key()
            .map(|_| ())
            .wrap_err("LLM API key not found")
    }

    /// Explicit path, else the first candidate that exists, else defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).wrap_err_with(|| format!("Failed to load config from {}", path.display()));
        }

        let Some(found) = Self::candidate_paths().into_iter().find(|p| p.exists()) else {
            info!("No config file found, using defaults");
            return Ok(Self::default());
        };

        Self::load_from_file(&found).or_else(|e| {
            warn!("Ignoring unreadable config {}: {:#}", found.display(), e);
            Ok(Self::default())
        })
    }

    /// Read only the log level, before logging is initialised
    ///
    /// Errors are swallowed: a broken config file is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => Some(path.clone()),
            None => Self::candidate_paths().into_iter().find(|p| p.exists()),
        }?;
        Self::load_from_file(path).ok().and_then(|c| c.log_level)
    }

    /// Project-local `.cadence.yml`, then `<config_dir>/cadence/cadence.yml`
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".cadence.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cadence").join("cadence.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).wrap_err("Failed to read config file")?;
        let config = serde_yaml::from_str(&content).wrap_err("Failed to parse config file")?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Which model to talk to and how
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LlmConfig {
    /// "anthropic" or "openai"
    pub provider: String,
    pub model: String,

    /// Name of the environment variable holding the key, never the key itself
    pub api_key_env: String,
    pub base_url: String,

    /// Ceiling for any single response
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    pub fn get_api_key(&self) -> Result<String> {
        debug!(api_key_env = %self.api_key_env, "get_api_key: called");
        std::env::var(&self.api_key_env).map_err(|_| eyre!("Set the {} environment variable", self.api_key_env))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Directory holding the profile and plan records
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: keystore::config::default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PromptsConfig {
    /// Directory of `<name>.pmt` files replacing the embedded templates
    pub override_dir: Option<PathBuf>,
}
