//! Environment-driven configuration

use crate::runtime::SessionConfig;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://etf-be-production.up.railway.app";
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Session token sent as a bearer credential
    pub token: Option<String>,
    pub history_limit: u32,
    pub connect_timeout: Duration,
    /// Overall per-request limit; `None` waits for the server indefinitely
    pub request_timeout: Option<Duration>,
    /// Assistant message shown when there is no history
    pub greeting: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
            greeting: None,
        }
    }
}

impl ClientConfig {
    /// Load from `ETF_CHAT_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup. Unset and blank values take
    /// the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let base_url = match get("ETF_CHAT_BASE_URL") {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => url,
            Some(url) => {
                return Err(ConfigError::InvalidUrl {
                    var: "ETF_CHAT_BASE_URL",
                    value: url,
                })
            }
            None => defaults.base_url,
        };

        let history_limit = match get("ETF_CHAT_HISTORY_LIMIT") {
            Some(raw) => parse_positive("ETF_CHAT_HISTORY_LIMIT", &raw)?,
            None => defaults.history_limit,
        };

        let connect_timeout = match get("ETF_CHAT_CONNECT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("ETF_CHAT_CONNECT_TIMEOUT_SECS", &raw)?.into()),
            None => defaults.connect_timeout,
        };

        let request_timeout = get("ETF_CHAT_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_positive("ETF_CHAT_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(|secs| Duration::from_secs(secs.into()));

        Ok(Self {
            base_url,
            token: get("ETF_CHAT_TOKEN"),
            history_limit,
            connect_timeout,
            request_timeout,
            greeting: get("ETF_CHAT_GREETING"),
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            history_limit: self.history_limit,
            greeting: self.greeting.clone(),
            hydrate_on_start: true,
        }
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        }),
    }
}
