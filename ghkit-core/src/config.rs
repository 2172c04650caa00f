//! User configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`GHKIT_*`)
//! 2. `<home>/.ghkit/config.yaml`
//! 3. Built-in defaults
//!
//! Every key is optional in the file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 1000;
pub const DEFAULT_STALE_AFTER_DAYS: u32 = 7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How remote queries reach the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Shell out to the authenticated `gh` CLI.
    #[default]
    Gh,
    /// POST straight to the GraphQL endpoint with a bearer token.
    Http,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Gh => write!(f, "gh"),
            TransportKind::Http => write!(f, "http"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gh" => Ok(Self::Gh),
            "http" | "https" => Ok(Self::Http),
            other => Err(format!("unknown transport '{other}'; expected: gh, http")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: TransportKind,
    pub api_url: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub stale_after_days: u32,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `<home>/.ghkit/config.yaml`
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".ghkit").join("config.yaml")
}

impl Config {
    /// Load file + process environment, rooted at `home`.
    pub fn load_at(home: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file_at(home)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// File layer only; defaults when the file is absent.
    pub fn from_file_at(home: &Path) -> Result<Self, ConfigError> {
        let path = config_path_at(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Apply `GHKIT_*` overrides using `lookup` as the environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GHKIT_TRANSPORT") {
            self.transport = v.parse().map_err(|message| ConfigError::Invalid {
                key: "transport",
                message,
            })?;
        }
        if let Some(v) = lookup("GHKIT_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("GHKIT_PAGE_SIZE") {
            self.page_size = parse_env("page_size", &v)?;
        }
        if let Some(v) = lookup("GHKIT_MAX_PAGES") {
            self.max_pages = parse_env("max_pages", &v)?;
        }
        if let Some(v) = lookup("GHKIT_STALE_AFTER_DAYS") {
            self.stale_after_days = parse_env("stale_after_days", &v)?;
        }
        if let Some(v) = lookup("GHKIT_TIMEOUT_SECS") {
            self.timeout_secs = parse_env("timeout_secs", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid {
                key: "page_size",
                message: format!("must be between 1 and {MAX_PAGE_SIZE}, got {}", self.page_size),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: "max_pages",
                message: "must be at least 1".to_string(),
            });
        }
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "api_url",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: format!("'{value}': {e}"),
    })
}
