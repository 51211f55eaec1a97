use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the configured endpoint
pub const ENDPOINT_ENV: &str = "CHATBOT_ENDPOINT";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat server; requests go to `{endpoint}/api/chat`
    pub endpoint: String,

    /// Whole-request timeout applied by the HTTP client
    pub request_timeout_secs: u64,

    /// Log file; the terminal is owned by the UI so logs never go to stderr
    pub log_file: Option<PathBuf>,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub placeholder: String,
    pub max_input_chars: usize,
    pub render_markdown: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: "http://localhost:3000".to_string(),
            request_timeout_secs: 60,
            log_file: None,
            ui: UiConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            placeholder: "Ask anything".to_string(),
            max_input_chars: 1000,
            render_markdown: true,
        }
    }
}

impl Config {
    /// Directory holding the config file and the default log file
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".chatbot"))
    }

    /// Load configuration from `path`, or from `~/.chatbot/config.toml`
    ///
    /// A missing file yields the defaults. The endpoint environment variable
    /// wins over the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::home_dir()?.join("config.toml"),
        };

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            Self::from_toml(&content)?
        } else {
            Config::default()
        };

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Full URL of the chat route
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.endpoint.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve where logs go: explicit setting, else `~/.chatbot/chatbot.log`
    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home_dir()?.join("chatbot.log")),
        }
    }
}
