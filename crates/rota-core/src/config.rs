//! Configuration system for rota.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{RotaError, RotaResult};
use crate::types::UserPair;

/// Bot identity and where it posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// The bot's own chat user id (without the `<@..>` wrapping).
    pub bot_user_id: String,
    /// Channel that receives the weekly reminder.
    pub reminder_channel: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_user_id: String::new(),
            reminder_channel: "dinners".to_string(),
        }
    }
}

/// Cadence of the periodic jobs (six-field cron, local time).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// When to post the reminder (default: Thursdays 18:30).
    pub reminder_cron: String,
    /// When to advance the rotation (default: Mondays 18:30).
    pub advance_cron: String,
    pub enable_reminder: bool,
    pub enable_advance: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            reminder_cron: "0 30 18 * * Thu".to_string(),
            advance_cron: "0 30 18 * * Mon".to_string(),
            enable_reminder: true,
            enable_advance: true,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database (None = in-memory).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let rota_dir = dirs::home_dir()
            .map(|h| h.join(".rota"))
            .unwrap_or_else(|| PathBuf::from(".rota"));

        Self {
            db_path: Some(rota_dir.join("rota.db")),
        }
    }
}

/// Initial rotation, used only when the store is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Pairs in rotation order, as canonical mentions.
    pub pairs: Vec<[String; 2]>,
    /// Week of the first pair (default: the current week).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_due: Option<NaiveDate>,
}

impl RotationConfig {
    pub fn user_pairs(&self) -> Vec<UserPair> {
        self.pairs
            .iter()
            .map(|[a, b]| UserPair::new(a.clone(), b.clone()))
            .collect()
    }
}

/// NLU classifier endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub base_url: String,
    /// API version pinned in each request.
    pub api_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.wit.ai".to_string(),
            api_version: "20170307".to_string(),
            access_token: None,
            timeout_secs: 10,
        }
    }
}

/// Chat workspace API, used for the user directory and outbound messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub base_url: String,
    /// Token for directory reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Token the bot posts with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://slack.com/api".to_string(),
            api_token: None,
            bot_token: None,
            timeout_secs: 10,
        }
    }
}

/// Main rota configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RotaConfig {
    pub bot: BotConfig,
    pub schedule: ScheduleConfig,
    pub store: StoreConfig,
    pub rotation: RotationConfig,
    pub classifier: ClassifierConfig,
    pub slack: SlackConfig,
}

impl RotaConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> RotaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| RotaError::Configuration(e.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| RotaError::Configuration(e.to_string()))
            }
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| RotaError::Configuration(e.to_string()))
            }
            _ => Err(RotaError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> RotaResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from `ROTA_CONFIG` if set, otherwise defaults, then apply environment overrides.
    pub fn load() -> RotaResult<Self> {
        let mut config = match std::env::var("ROTA_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from environment variables.
    ///
    /// Reads:
    /// - `ROTA_BOT_USER_ID`, `ROTA_REMINDER_CHANNEL`
    /// - `ROTA_REMINDER_CRON`, `ROTA_ADVANCE_CRON`
    /// - `ROTA_DISABLE_REMINDER`, `ROTA_DISABLE_ADVANCE`
    /// - `ROTA_DB_PATH` (`:memory:` for an in-memory store)
    /// - `ROTA_PAIRS` (`<@U1>:<@U2>,<@U3>:<@U4>`), `ROTA_FIRST_DUE` (`YYYY-MM-DD`)
    /// - `WIT_ACCESS_TOKEN`, `WIT_BASE_URL`
    /// - `SLACK_API_TOKEN`, `SLACK_BOT_TOKEN`, `SLACK_BASE_URL`
    pub fn apply_env(&mut self) -> RotaResult<()> {
        if let Ok(id) = std::env::var("ROTA_BOT_USER_ID") {
            self.bot.bot_user_id = id;
        }
        if let Ok(channel) = std::env::var("ROTA_REMINDER_CHANNEL") {
            self.bot.reminder_channel = channel;
        }

        if let Ok(cron) = std::env::var("ROTA_REMINDER_CRON") {
            self.schedule.reminder_cron = cron;
        }
        if let Ok(cron) = std::env::var("ROTA_ADVANCE_CRON") {
            self.schedule.advance_cron = cron;
        }
        if std::env::var("ROTA_DISABLE_REMINDER").is_ok() {
            self.schedule.enable_reminder = false;
        }
        if std::env::var("ROTA_DISABLE_ADVANCE").is_ok() {
            self.schedule.enable_advance = false;
        }

        if let Ok(path) = std::env::var("ROTA_DB_PATH") {
            self.store.db_path = match path.as_str() {
                ":memory:" => None,
                _ => Some(PathBuf::from(path)),
            };
        }

        if let Ok(pairs) = std::env::var("ROTA_PAIRS") {
            self.rotation.pairs = parse_pairs(&pairs)?;
        }
        if let Ok(first_due) = std::env::var("ROTA_FIRST_DUE") {
            let date = NaiveDate::parse_from_str(&first_due, "%Y-%m-%d").map_err(|e| {
                RotaError::Configuration(format!("ROTA_FIRST_DUE '{}': {}", first_due, e))
            })?;
            self.rotation.first_due = Some(date);
        }

        if let Ok(token) = std::env::var("WIT_ACCESS_TOKEN") {
            self.classifier.access_token = Some(token);
        }
        if let Ok(url) = std::env::var("WIT_BASE_URL") {
            self.classifier.base_url = url;
        }

        if let Ok(token) = std::env::var("SLACK_API_TOKEN") {
            self.slack.api_token = Some(token);
        }
        if let Ok(token) = std::env::var("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(token);
        }
        if let Ok(url) = std::env::var("SLACK_BASE_URL") {
            self.slack.base_url = url;
        }

        Ok(())
    }

    /// Check the settings the core cannot run without.
    pub fn validate(&self) -> RotaResult<()> {
        if self.bot.bot_user_id.trim().is_empty() {
            return Err(RotaError::Configuration(
                "bot.bot_user_id is required (ROTA_BOT_USER_ID)".to_string(),
            ));
        }
        for [a, b] in &self.rotation.pairs {
            if a.trim().is_empty() || b.trim().is_empty() {
                return Err(RotaError::Configuration(
                    "rotation pairs need two non-empty users".to_string(),
                ));
            }
            if a == b {
                return Err(RotaError::Configuration(format!(
                    "rotation pair lists {} twice",
                    a
                )));
            }
        }
        Ok(())
    }
}

/// Parse `a:b,c:d` into pairs.
fn parse_pairs(raw: &str) -> RotaResult<Vec<[String; 2]>> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let (a, b) = p.split_once(':').ok_or_else(|| {
                RotaError::Configuration(format!("pair '{}' is not in 'a:b' form", p))
            })?;
            Ok([a.trim().to_string(), b.trim().to_string()])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RotaConfig::default();
        assert_eq!(config.schedule.reminder_cron, "0 30 18 * * Thu");
        assert_eq!(config.schedule.advance_cron, "0 30 18 * * Mon");
        assert!(config.schedule.enable_reminder);
        assert!(config.store.db_path.is_some());
        assert!(config.rotation.pairs.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[bot]
bot_user_id = "UBOT"
reminder_channel = "C123"

[rotation]
pairs = [["<@U1>", "<@U2>"], ["<@U3>", "<@U4>"]]
first_due = "2024-06-03"
"#
        )
        .unwrap();

        let config = RotaConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bot.bot_user_id, "UBOT");
        assert_eq!(config.rotation.user_pairs().len(), 2);
        assert_eq!(config.rotation.first_due, NaiveDate::from_ymd_opt(2024, 6, 3));
        assert_eq!(config.schedule.advance_cron, "0 30 18 * * Mon");
        config.validate().unwrap();
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "bot:\n  bot_user_id: UBOT\nschedule:\n  enable_advance: false").unwrap();
        let config = RotaConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bot.bot_user_id, "UBOT");
        assert!(!config.schedule.enable_advance);
        assert!(config.schedule.enable_reminder);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            RotaConfig::from_file(file.path()),
            Err(RotaError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs("<@U1>:<@U2>, <@U3>:<@U4>,").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], ["<@U3>".to_string(), "<@U4>".to_string()]);
        assert!(parse_pairs("<@U1>").is_err());
    }

    #[test]
    fn test_validate_rejects_self_pair() {
        let mut config = RotaConfig::default();
        config.bot.bot_user_id = "UBOT".to_string();
        config.rotation.pairs = vec![["<@U1>".to_string(), "<@U1>".to_string()]];
        assert!(config.validate().is_err());
    }
}
