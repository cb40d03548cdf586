//! Configuration management for memefeed.
//!
//! Loads configuration from ${MEMEFEED_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::fetch::FetchSettings;

/// Whether chats share one browsing session and favorites list or each
/// chat gets its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    /// One session for the whole process; every chat sees the same cursor
    /// and favorites.
    Shared,
    /// One session per chat (default)
    #[default]
    PerChat,
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token for Telegram API.
    pub bot_token: Option<String>,
    /// Numeric Telegram user IDs allowed to use the bot. Empty allows everyone.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowlist_user_ids: Vec<i64>,
    /// Long-poll timeout for getUpdates.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowlist_user_ids: Vec::new(),
            poll_timeout_secs: 30,
        }
    }
}

impl TelegramConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

/// Reddit content source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    /// OAuth app client id. Without credentials the public listing is used.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: default_user_agent(),
            request_timeout_secs: 20,
        }
    }
}

impl RedditConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Client credentials from config, falling back to the environment.
    pub fn credentials(&self) -> Option<(String, String)> {
        let id = non_empty(self.client_id.as_deref()).or_else(|| env_value("REDDIT_CLIENT_ID"))?;
        let secret = non_empty(self.client_secret.as_deref())
            .or_else(|| env_value("REDDIT_CLIENT_SECRET"))?;
        Some((id, secret))
    }
}

fn default_user_agent() -> String {
    format!("memefeed/{}", crate::VERSION)
}

/// Feed selection and session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Topics (subreddits) to draw from; one is chosen at random per fetch.
    pub topics: Vec<String>,
    /// Minimum popularity score for a candidate.
    pub min_score: u64,
    /// Candidates requested per fetch.
    pub batch_size: usize,
    /// Titles longer than this many characters are cut with "...".
    pub max_title_len: usize,
    pub session_scope: SessionScope,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            topics: ["memes", "dankmemes", "wholesomememes", "me_irl"]
                .map(String::from)
                .to_vec(),
            min_score: 5000,
            batch_size: 50,
            max_title_len: 250,
            session_scope: SessionScope::default(),
        }
    }
}

impl FeedConfig {
    pub const MAX_BATCH_SIZE: usize = 100;

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            topics: self
                .topics
                .iter()
                .map(|topic| topic.trim().to_string())
                .collect(),
            batch_size: self.batch_size,
            min_score: self.min_score,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
    /// Directory for a daily-rolling log file. Unset logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub reddit: RedditConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default template to `path`.
    ///
    /// Fails if the file already exists. Creates parent directories.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Bot token from config, falling back to `MEMEFEED_TELEGRAM_BOT_TOKEN`.
    pub fn bot_token(&self) -> Option<String> {
        non_empty(self.telegram.bot_token.as_deref())
            .or_else(|| env_value("MEMEFEED_TELEGRAM_BOT_TOKEN"))
    }

    /// Checks the values the bot cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.feed.topics.is_empty() {
            bail!("feed.topics must contain at least one topic");
        }
        if let Some(index) = self
            .feed
            .topics
            .iter()
            .position(|topic| topic.trim().is_empty())
        {
            bail!("feed.topics[{index}] is blank");
        }
        if !(1..=FeedConfig::MAX_BATCH_SIZE).contains(&self.feed.batch_size) {
            bail!(
                "feed.batch_size must be between 1 and {}",
                FeedConfig::MAX_BATCH_SIZE
            );
        }
        if self.feed.max_title_len == 0 {
            bail!("feed.max_title_len must be at least 1");
        }
        if self.bot_token().is_none() {
            bail!("telegram.bot_token or MEMEFEED_TELEGRAM_BOT_TOKEN is required");
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub mod paths {
    //! Path resolution for memefeed configuration.
    //!
    //! MEMEFEED_HOME resolution order:
    //! 1. MEMEFEED_HOME environment variable (if set)
    //! 2. ~/.config/memefeed (default)

    use std::path::PathBuf;

    /// Returns the memefeed home directory.
    pub fn memefeed_home() -> PathBuf {
        if let Ok(home) = std::env::var("MEMEFEED_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("memefeed"))
            .unwrap_or_else(|| PathBuf::from(".memefeed"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        memefeed_home().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn with_token(mut config: Config) -> Config {
        config.telegram.bot_token = Some("123:abc".to_string());
        config
    }

    #[test]
    fn missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(config.feed.min_score, 5000);
        assert_eq!(config.feed.batch_size, 50);
        assert_eq!(config.feed.max_title_len, 250);
        assert_eq!(config.feed.session_scope, SessionScope::PerChat);
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.feed.topics.len(), 4);
    }

    #[test]
    fn partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[feed]\nmin_score = 10\nsession_scope = \"shared\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.feed.min_score, 10);
        assert_eq!(config.feed.session_scope, SessionScope::Shared);
        assert_eq!(config.feed.batch_size, 50);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[feed\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn init_writes_template_that_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subdir").join("config.toml");
        Config::init(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.feed.min_score, FeedConfig::default().min_score);
        assert!(Config::init(&path).is_err());
    }

    #[test]
    fn validate_rejects_bad_feed_values() {
        let mut config = with_token(Config::default());
        assert!(config.validate().is_ok());

        config.feed.batch_size = 0;
        assert!(config.validate().is_err());
        config.feed.batch_size = 101;
        assert!(config.validate().is_err());
        config.feed.batch_size = 50;

        config.feed.topics = vec!["  ".to_string()];
        assert!(config.validate().is_err());
        config.feed.topics = Vec::new();
        assert!(config.validate().is_err());
        config.feed.topics = vec!["memes".to_string()];

        config.feed.max_title_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_a_single_blank_topic() {
        let mut config = with_token(Config::default());
        config.feed.topics = vec!["memes".to_string(), " ".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("feed.topics[1]"));

        config.feed.topics = vec![" memes ".to_string()];
        assert!(config.validate().is_ok());
        assert_eq!(config.feed.fetch_settings().topics, ["memes"]);
    }

    #[test]
    fn blank_config_values_are_ignored() {
        let mut config = Config::default();
        config.telegram.bot_token = Some("   ".to_string());
        assert_eq!(non_empty(config.telegram.bot_token.as_deref()), None);
        config.telegram.bot_token = Some(" 1:x ".to_string());
        assert_eq!(config.bot_token().as_deref(), Some("1:x"));
    }
}
