//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the API base URL and the last username that logged in.
//!
//! Configuration is stored at `~/.config/commentdesk/config.json`. The base URL
//! can be overridden with the `COMMENTDESK_API_URL` environment variable.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "commentdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the API base URL
pub const API_URL_ENV: &str = "COMMENTDESK_API_URL";

/// Base URL used when neither the environment nor the config file sets one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// HTTP request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Resolve the API base URL: environment, then config file, then default.
    pub fn api_base_url(&self) -> String {
        self.resolve_api_base_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_api_base_url(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session and log files
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
