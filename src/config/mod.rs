//! Configuration management for the course navigator

pub mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured platform URL
pub const API_URL_ENV: &str = "COURSE_NAVIGATOR_API_URL";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the course platform API
    pub api_base_url: String,

    /// HTTP timeout for every platform call
    pub request_timeout_secs: u64,

    /// Whether the account holds a premium plan
    pub premium: bool,

    /// Column width for lesson text
    pub wrap_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 30,
            premium: false,
            wrap_width: 88,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Load from an explicit path, writing defaults when the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Replace the platform URL with a non-empty override
    pub fn apply_env_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!("Using platform URL from {}", API_URL_ENV);
            self.api_base_url = url.trim().to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "course-navigator")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "course-navigator")
            .context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn default_config_points_at_local_platform() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert!(!config.premium);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let json = r#"{"api_base_url":"https://learn.example.com","premium":true}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_base_url, "https://learn.example.com");
        assert!(config.premium);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.wrap_width, 88);
    }

    #[test]
    fn load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = Config { premium: true, wrap_width: 72, ..Config::default() };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn env_override_replaces_url() {
        let mut config = Config::default();
        config.apply_env_override(Some(" https://api.example.com ".into()));
        assert_eq!(config.api_base_url, "https://api.example.com");

        config.apply_env_override(Some("   ".into()));
        assert_eq!(config.api_base_url, "https://api.example.com");
    }

    #[test]
    fn timeout_is_never_zero() {
        let config = Config { request_timeout_secs: 0, ..Config::default() };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
