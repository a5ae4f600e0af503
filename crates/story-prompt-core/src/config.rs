//! Environment-driven settings shared by the binaries.
//!
//! | Variable | Default |
//! |---|---|
//! | `STORY_PROMPT_LOG_FORMAT` (`text` or `json`) | `text` |
//! | `STORY_PROMPT_LOG_LEVEL` | `info` |
//! | `STORY_PROMPT_MAX_REQUEST_BYTES` | `1048576` |
//!
//! `RUST_LOG`, when set, still wins over the level for filtering.

use std::str::FromStr;

use tracing::Level;

use crate::error::{Result, StoryPromptError};

pub const ENV_LOG_FORMAT: &str = "STORY_PROMPT_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "STORY_PROMPT_LOG_LEVEL";
pub const ENV_MAX_REQUEST_BYTES: &str = "STORY_PROMPT_MAX_REQUEST_BYTES";

/// Upper bound on a single request line accepted by the request loop.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = StoryPromptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(StoryPromptError::Config(format!(
                "{ENV_LOG_FORMAT} must be 'text' or 'json', got '{other}'"
            ))),
        }
    }
}

/// Process-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub log_format: LogFormat,
    pub log_level: Level,
    pub max_request_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Text,
            log_level: Level::INFO,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset
    /// variables. Set-but-invalid values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            config.log_format = format.parse()?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = Level::from_str(level.trim()).map_err(|_| {
                StoryPromptError::Config(format!("{ENV_LOG_LEVEL} is not a log level: '{level}'"))
            })?;
        }

        if let Some(limit) = lookup(ENV_MAX_REQUEST_BYTES) {
            config.max_request_bytes = limit
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    StoryPromptError::Config(format!(
                        "{ENV_MAX_REQUEST_BYTES} must be a positive integer, got '{limit}'"
                    ))
                })?;
        }

        Ok(config)
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, json: bool, verbose: bool) -> Self {
        if json {
            self.log_format = LogFormat::Json;
        }
        if verbose {
            self.log_level = Level::DEBUG;
        }
        self
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == LogFormat::Json
    }
}
