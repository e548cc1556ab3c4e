/*!
Configuration management for the unfollow tracker
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use instagram_api::ClientConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Which account to track
    pub account: AccountConfig,
    /// Where snapshots and sessions live
    pub storage: StorageConfig,
    /// Check scheduling
    pub polling: PollingConfig,
    /// Web API settings
    pub api: ApiConfig,
    /// Console report settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Falls back to INSTAGRAM_USER, then an interactive prompt
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Snapshot file name inside `data_dir`
    pub snapshot_file: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds to sleep between checks
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: TerminalFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalFormat {
    Plain,
    #[default]
    Colored,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("polling.interval_secs must be at least 1")]
    ZeroInterval,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_file: "followers.json".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            base_url: client.base_url,
            user_agent: client.user_agent,
            page_size: client.page_size,
        }
    }
}

impl TrackerConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `<config_dir>/unfollow-tracker/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("unfollow-tracker").join("config.toml"))
    }

    /// Explicit path if given, else the default path when that file exists,
    /// else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|path| path.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.snapshot_file)
    }

    pub fn session_path(&self, username: &str) -> PathBuf {
        self.storage.data_dir.join(format!("{username}_session"))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            user_agent: self.api.user_agent.clone(),
            page_size: self.api.page_size,
        }
    }
}
