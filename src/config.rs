//! Settings loader and credential check for the homework status bot.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
const DEFAULT_RETRY_PERIOD_SECS: u64 = 600;
const MAX_RETRY_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingTokens(Vec<&'static str>),
}

/// Non-secret settings, optionally read from a YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub practicum: Practicum,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    pub retry_period_secs: u64,
    pub alert_on_error: bool,
}

impl App {
    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            retry_period_secs: DEFAULT_RETRY_PERIOD_SECS,
            alert_on_error: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Practicum {
    pub endpoint: String,
}

impl Default for Practicum {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// The three secrets the bot cannot run without.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"[REDACTED]")
            .field("telegram_token", &"[REDACTED]")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Credentials {
    pub fn new(
        practicum_token: impl Into<String>,
        telegram_token: impl Into<String>,
        telegram_chat_id: impl Into<String>,
    ) -> Self {
        Self {
            practicum_token: practicum_token.into(),
            telegram_token: telegram_token.into(),
            telegram_chat_id: telegram_chat_id.into(),
        }
    }

    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary variable lookup; absent keys become empty.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            practicum_token: get(PRACTICUM_TOKEN),
            telegram_token: get(TELEGRAM_TOKEN),
            telegram_chat_id: get(TELEGRAM_CHAT_ID),
        }
    }

    /// Names of the variables that are absent or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (PRACTICUM_TOKEN, &self.practicum_token),
            (TELEGRAM_TOKEN, &self.telegram_token),
            (TELEGRAM_CHAT_ID, &self.telegram_chat_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingTokens(missing))
        }
    }
}

/// Everything the poller and its collaborators need, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub credentials: Credentials,
}

impl Config {
    /// Combine validated settings with credentials. Credentials are checked
    /// separately by `Credentials::check` before this is called.
    pub fn new(settings: Settings, credentials: Credentials) -> Result<Self, ConfigError> {
        validate(&settings)?;
        Ok(Self {
            settings,
            credentials,
        })
    }

    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.settings.practicum.endpoint)
            .map_err(|_| ConfigError::Invalid("practicum.endpoint must be a valid URL"))
    }
}

/// Load settings from a YAML file and validate them.
/// - If `path` is None, uses `config.yaml` in the working directory when it
///   exists and built-in defaults otherwise.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings = match path {
        Some(path) => parse(&fs::read_to_string(path)?)?,
        None => {
            let default_path = Path::new("config.yaml");
            if default_path.exists() {
                parse(&fs::read_to_string(default_path)?)?
            } else {
                Settings::default()
            }
        }
    };
    validate(&settings)?;
    Ok(settings)
}

fn parse(content: &str) -> Result<Settings, ConfigError> {
    // An empty document deserializes to unit, not to a map.
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.app.retry_period_secs == 0 {
        return Err(ConfigError::Invalid("app.retry_period_secs must be > 0"));
    }
    if settings.app.retry_period_secs > MAX_RETRY_PERIOD_SECS {
        return Err(ConfigError::Invalid("app.retry_period_secs is too large"));
    }
    if settings.practicum.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid("practicum.endpoint must be non-empty"));
    }
    if Url::parse(&settings.practicum.endpoint).is_err() {
        return Err(ConfigError::Invalid("practicum.endpoint must be a valid URL"));
    }
    Ok(())
}

/// Example settings file documenting every key with its default.
pub fn example() -> &'static str {
    r#"app:
  retry_period_secs: 600
  alert_on_error: true

practicum:
  endpoint: "https://practicum.yandex.ru/api/user_api/homework_statuses/"
"#
}
