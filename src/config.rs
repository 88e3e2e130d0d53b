use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::{api, chat};
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_analyze_path")]
    pub analyze_path: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatConfig {
    /// Greeting shown as the first system message; `null` disables it
    #[serde(default = "default_welcome")]
    pub welcome_message: Option<String>,
    /// Print intermediate progress updates, not only final answers
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    api::DEFAULT_BASE_URL.to_string()
}

fn default_analyze_path() -> String {
    api::ANALYZE_PATH.to_string()
}

fn default_connect_timeout() -> u64 {
    api::DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_welcome() -> Option<String> {
    Some(chat::WELCOME_MESSAGE.to_string())
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            analyze_path: default_analyze_path(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome(),
            show_progress: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            chat: ChatConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load `config.yaml` from the working directory, then apply environment
    /// overrides. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from("config.yaml")?;
        if let Ok(url) = std::env::var(api::BASE_URL_ENV) {
            config.api.base_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.base_url)?;
        if !self.api.analyze_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "api.analyze_path must start with '/': {}",
                self.api.analyze_path
            )));
        }
        Ok(())
    }

    /// Full URL of the analysis endpoint
    pub fn analyze_url(&self) -> Result<url::Url, url::ParseError> {
        url::Url::parse(&format!(
            "{}{}",
            self.api.base_url.trim_end_matches('/'),
            self.api.analyze_path
        ))
    }
}
