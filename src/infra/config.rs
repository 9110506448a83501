// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::errors::WkError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_version: String,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.wanikani.com".into(),
            api_version: "v1.1".into(),
            timeout_seconds: 30,
            api_key: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_age_hours: u64,
    pub persistent: bool,
    /// Override for the SQLite file; defaults to the data directory.
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 2,
            persistent: true,
            path: None,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_hours * 60 * 60)
    }

    pub fn db_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(paths::cache_db_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self, WkError> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, WkError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| WkError::Config(format!("{}: {e}", path.display())))
    }

    /// Pick the API key: explicit value, then WANIKANI_API_KEY, then config.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String, WkError> {
        if let Some(key) = explicit.filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }
        if let Ok(key) = std::env::var("WANIKANI_API_KEY") {
            if !key.is_empty() {
                return Ok(key);
            }
        }
        self.api
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(WkError::NoApiKey)
    }
}
