use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_WEBHOOK_PATH: &str = "/api/telegram";

/// Errors that can occur when reading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Unparseable Bot API URL.
    InvalidUrl { value: String, reason: String },
    /// Unparseable listen address.
    InvalidAddr { value: String, source: std::net::AddrParseError },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { value, reason } => {
                write!(f, "invalid TELEGRAM_API_URL '{}': {}", value, reason)
            }
            Self::InvalidAddr { value, source } => {
                write!(f, "invalid BIND_ADDR '{}': {}", value, source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidAddr { source, .. } => Some(source),
            Self::InvalidUrl { .. } | Self::Validation(_) => None,
        }
    }
}

pub struct Config {
    /// Empty when unset; Telegram will then refuse every send.
    pub telegram_bot_token: String,
    /// Bot API base URL, without the `/bot<token>` suffix.
    pub telegram_api_url: reqwest::Url,
    pub bind_addr: SocketAddr,
    /// Route the webhook is served on.
    pub webhook_path: String,
    /// JSON knowledge base. Built-in data is used when unset.
    pub knowledge_path: Option<PathBuf>,
    /// Directory for an extra log file.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();

        let api_url = get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let telegram_api_url = reqwest::Url::parse(&api_url).map_err(|e| ConfigError::InvalidUrl {
            value: api_url.clone(),
            reason: e.to_string(),
        })?;

        let addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = addr
            .parse()
            .map_err(|e| ConfigError::InvalidAddr { value: addr.clone(), source: e })?;

        let webhook_path = get("WEBHOOK_PATH").unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
        if !webhook_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "WEBHOOK_PATH must start with '/', got '{webhook_path}'"
            )));
        }

        Ok(Self {
            telegram_bot_token,
            telegram_api_url,
            bind_addr,
            webhook_path,
            knowledge_path: get("KNOWLEDGE_FILE").map(PathBuf::from),
            log_dir: get("LOG_DIR").map(PathBuf::from),
        })
    }
}
