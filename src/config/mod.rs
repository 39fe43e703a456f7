//! Configuration handling for the parsing service.
//!
//! Everything is read from environment variables with development defaults.
//! `Config::from_env` validates numeric values so a bad deployment fails at
//! startup instead of on the first request.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Environment variable names.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_USER_AGENT: &str = "PARSER_USER_AGENT";
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "PARSER_DEFAULT_TIMEOUT_MS";
pub const ENV_WORDS_PER_MINUTE: &str = "PARSER_WORDS_PER_MINUTE";
pub const ENV_DEFAULT_LANGUAGE: &str = "PARSER_DEFAULT_LANGUAGE";
pub const ENV_RENDERING: &str = "PARSER_RENDERING";
pub const ENV_CHROME_PATH: &str = "CHROME_PATH";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_USER_AGENT: &str = "LinkRadio Content Parser 1.0";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;
pub const DEFAULT_LANGUAGE: &str = "ko";

/// How pages are acquired before falling back to a plain HTTP GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingMode {
    /// Launch a headless Chromium session per request.
    Chromium,
    /// Skip the browser entirely; every fetch goes straight to HTTP.
    Disabled,
}

impl RenderingMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "disabled" | "off" | "none" | "http" => Ok(Self::Disabled),
            other => Err(ConfigError::InvalidValue {
                field: ENV_RENDERING,
                reason: format!("unknown rendering mode '{}'", other),
            }),
        }
    }
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    user_agent: String,
    default_timeout_ms: u64,
    words_per_minute: u32,
    default_language: String,
    rendering: RenderingMode,
    chrome_path: Option<PathBuf>,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let user_agent =
            env::var(ENV_USER_AGENT).unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let default_language =
            env::var(ENV_DEFAULT_LANGUAGE).unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string());

        let default_timeout_ms = match env::var(ENV_DEFAULT_TIMEOUT_MS) {
            Ok(raw) => parse_number::<u64>(ENV_DEFAULT_TIMEOUT_MS, &raw)?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&default_timeout_ms) {
            return Err(ConfigError::InvalidValue {
                field: ENV_DEFAULT_TIMEOUT_MS,
                reason: format!(
                    "must be between {} and {} ms, got {}",
                    MIN_TIMEOUT_MS, MAX_TIMEOUT_MS, default_timeout_ms
                ),
            });
        }

        let words_per_minute = match env::var(ENV_WORDS_PER_MINUTE) {
            Ok(raw) => parse_number::<u32>(ENV_WORDS_PER_MINUTE, &raw)?,
            Err(_) => DEFAULT_WORDS_PER_MINUTE,
        };
        if words_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_WORDS_PER_MINUTE,
                reason: "must be greater than zero".to_string(),
            });
        }

        let rendering = match env::var(ENV_RENDERING) {
            Ok(raw) => RenderingMode::parse(&raw)?,
            Err(_) => RenderingMode::Chromium,
        };

        let chrome_path = env::var(ENV_CHROME_PATH)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            user_agent,
            default_timeout_ms,
            words_per_minute,
            default_language,
            rendering,
            chrome_path,
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// User-Agent sent by the HTTP fallback fetch and the content-type probe.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
    /// Fetch/navigation timeout used when a request does not specify one.
    pub fn default_timeout_ms(&self) -> u64 {
        self.default_timeout_ms
    }
    pub fn words_per_minute(&self) -> u32 {
        self.words_per_minute
    }
    /// Language tag used when a page declares none.
    pub fn default_language(&self) -> &str {
        &self.default_language
    }
    pub fn rendering(&self) -> RenderingMode {
        self.rendering
    }
    /// Explicit browser executable; `None` lets chromiumoxide locate one.
    pub fn chrome_path(&self) -> Option<&PathBuf> {
        self.chrome_path.as_ref()
    }

    /// Returns a copy with the given rendering mode.
    pub fn with_rendering(mut self, rendering: RenderingMode) -> Self {
        self.rendering = rendering;
        self
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            default_language: DEFAULT_LANGUAGE.to_string(),
            rendering: RenderingMode::Chromium,
            chrome_path: None,
        }
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        field,
        reason: format!("'{}' is not a valid number", raw),
    })
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
