use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub reddit: RedditConfig,
    pub storage: StorageConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    pub api_base: String,
    /// Long-poll timeout passed to getUpdates.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 60,
        }
    }
}

impl TelegramConfig {
    pub fn masked_token(&self) -> String {
        match self.token.split_once(':') {
            Some((bot_id, _)) => format!("{}:***", bot_id),
            None => "***".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub subreddit: String,
    pub poll_interval_secs: u64,
    pub user_agent: String,
    /// App-only OAuth credentials; anonymous listing access when absent.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub limit: u32,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddit: "mechmarket".to_string(),
            poll_interval_secs: 15,
            user_agent: format!("rust:mechwatch:{}", env!("CARGO_PKG_VERSION")),
            client_id: None,
            client_secret: None,
            limit: 25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the file backend, database file for SQLite.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Buffer of each producer channel; producers wait when it is full.
    pub channel_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
        }
    }
}

impl AppConfig {
    /// Reads a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "telegram.token".to_string(),
            });
        }
        if self.reddit.subreddit.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "reddit.subreddit".to_string(),
            });
        }
        if self.reddit.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reddit.poll_interval_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.dispatch.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.channel_capacity".to_string(),
                value: "0".to_string(),
            });
        }
        if self.reddit.client_id.is_some() != self.reddit.client_secret.is_some() {
            return Err(ConfigError::MissingField {
                field: "reddit.client_id/reddit.client_secret".to_string(),
            });
        }
        Ok(())
    }
}
