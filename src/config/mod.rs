//! Typed configuration
//!
//! Runtime configuration for the bot, loaded from a JSON5 file with
//! environment overrides for secrets. Every section has working
//! defaults so an empty file is a valid configuration.

use crate::channels::slack::SlackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration load errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Slack configuration
    #[serde(default)]
    pub slack: SlackConfig,

    /// Poll behavior configuration
    #[serde(default)]
    pub polls: PollsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quorum")
        .join("quorum.db")
}

/// Poll behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollsConfig {
    /// Default poll duration when a command does not specify one
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u64,

    /// How often the reaper scans for overdue open polls
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_seconds: u64,
}

impl Default for PollsConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: default_duration_minutes(),
            reaper_interval_seconds: default_reaper_interval(),
        }
    }
}

fn default_duration_minutes() -> u64 {
    60
}

fn default_reaper_interval() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Log level filter (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted log lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a JSON5 file, falling back to defaults
    /// when the file is absent, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Io(e.to_string()))?;
                json5::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            _ => Self::default(),
        };

        // Secrets come from the environment, never the config file
        if let Ok(token) = std::env::var("SLACK_BOT_TOKEN") {
            config.slack.bot_token = token;
        }
        if let Ok(channel) = std::env::var("SLACK_STARTUP_CHANNEL") {
            config.slack.startup_channel = Some(channel);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.polls.default_duration_minutes, 60);
        assert_eq!(config.polls.reaper_interval_seconds, 60);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_parse_json5_partial() {
        let config: Config = json5::from_str(
            r#"{
                // comments are allowed
                polls: { defaultDurationMinutes: 15 },
                logging: { level: "debug", json: true },
            }"#,
        )
        .unwrap();
        assert_eq!(config.polls.default_duration_minutes, 15);
        assert_eq!(config.polls.reaper_interval_seconds, 60);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/quorum.json5"))).unwrap();
        assert_eq!(config.polls.default_duration_minutes, 60);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json5");
        std::fs::write(&path, r#"{ database: { path: "/tmp/test.db" } }"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/test.db"));
    }
}
