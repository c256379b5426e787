//! Application configuration and per-user file locations
//!
//! The config file lives at `<config_dir>/nilufar/config.toml` and holds the
//! DeepSeek API key plus the analysis timeout/retry knobs. The database and
//! the last-logged-in-username memory file live under
//! `<data_dir>/nilufar/`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

const APP_DIR: &str = "nilufar";

/// Placeholder API key meaning "not configured"
pub const API_KEY_UNSET: &str = "sk-";

/// DeepSeek credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepseekSection {
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

impl Default for DeepseekSection {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
        }
    }
}

fn default_api_key() -> String {
    API_KEY_UNSET.to_string()
}

/// Analysis call tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSection {
    /// Request timeout for a full analysis call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Shorter timeout used by the connection test
    #[serde(default = "default_test_timeout_secs")]
    pub connect_test_timeout_secs: u64,
    /// Retries after a timed-out analysis call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_test_timeout_secs: default_test_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_test_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub deepseek: DeepseekSection,
    #[serde(default)]
    pub settings: SettingsSection,
}

impl Config {
    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load from the per-user config path
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Write to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Cannot serialize config: {}", e)))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Write to the per-user config path
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// The configured API key, or `None` while it is still the `sk-`
    /// placeholder
    pub fn api_key(&self) -> Option<&str> {
        let key = self.deepseek.api_key.trim();
        if key.is_empty() || key == API_KEY_UNSET {
            None
        } else {
            Some(key)
        }
    }
}

/// Per-user config file path
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| Error::Config("Cannot determine the user config directory".into()))?;
    Ok(base.join(APP_DIR).join("config.toml"))
}

/// Per-user data directory (created on demand)
pub fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| Error::Config("Cannot determine the user data directory".into()))?;
    let dir = base.join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default location of the database file
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("restaurant.db"))
}

/// Remember the last successfully logged-in username
///
/// Failures are deliberately silent: losing this convenience file must never
/// break a login.
pub fn save_last_username_to(path: &Path, username: &str) {
    let _ = std::fs::write(path, username);
}

/// Read the remembered username, if any
pub fn last_username_from(path: &Path) -> Option<String> {
    let name = std::fs::read_to_string(path).ok()?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn last_username_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("last_user.txt"))
}

/// Remember the last username in the per-user data directory
pub fn save_last_username(username: &str) {
    if let Ok(path) = last_username_path() {
        save_last_username_to(&path, username);
    }
}

/// Read the remembered username from the per-user data directory
pub fn last_username() -> Option<String> {
    last_username_from(&last_username_path().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.deepseek.api_key, "sk-");
        assert_eq!(config.settings.timeout_secs, 90);
        assert_eq!(config.settings.connect_test_timeout_secs, 10);
        assert_eq!(config.settings.max_retries, 2);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_api_key_sentinel() {
        let mut config = Config::default();
        assert!(config.api_key().is_none());

        config.deepseek.api_key = "  ".to_string();
        assert!(config.api_key().is_none());

        config.deepseek.api_key = "sk-abc123".to_string();
        assert_eq!(config.api_key(), Some("sk-abc123"));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = Config::default();
        config.deepseek.api_key = "sk-live".to_string();
        config.settings.max_retries = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key(), Some("sk-live"));
        assert_eq!(loaded.settings.max_retries, 5);
        assert_eq!(loaded.settings.timeout_secs, 90);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[deepseek]\napi_key = \"sk-x\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_key(), Some("sk-x"));
        assert_eq!(config.settings.timeout_secs, 90);
    }

    #[test]
    fn test_last_username_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_user.txt");

        assert!(last_username_from(&path).is_none());
        save_last_username_to(&path, "gulnar");
        assert_eq!(last_username_from(&path).as_deref(), Some("gulnar"));
    }
}
