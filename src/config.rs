// src/config.rs
//
// Dashboard configuration
//
// Sources, later wins:
// 1. Defaults
// 2. <config_dir>/educhub/config.json (if present)
// 3. EDUCHUB_* environment variables

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Accepted range for the search settle interval
pub const SETTLE_RANGE_MS: (u64, u64) = (300, 500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Fetch the full list once and paginate locally
    #[default]
    Client,
    /// Ask the backend for one page at a time; never re-slice locally
    Server,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub settle_interval_ms: u64,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub pagination_mode: PaginationMode,
    /// Controller events kept for inspection
    pub event_log_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            auth_token: None,
            settle_interval_ms: 400,
            page_size: 10,
            request_timeout_secs: 30,
            pagination_mode: PaginationMode::Client,
            event_log_capacity: 256,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then the config file, then the environment; validated.
    pub fn load() -> AppResult<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// `<config_dir>/educhub/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("educhub").join("config.json"))
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        log::debug!("Loaded dashboard config from {}", path.display());
        Ok(config)
    }

    /// Apply `EDUCHUB_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("EDUCHUB_API_URL") {
            self.api_base_url = url;
        }
        if let Some(token) = lookup("EDUCHUB_TOKEN") {
            self.auth_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(ms) = lookup("EDUCHUB_SETTLE_MS") {
            self.settle_interval_ms = parse_number("EDUCHUB_SETTLE_MS", &ms)?;
        }
        if let Some(size) = lookup("EDUCHUB_PAGE_SIZE") {
            self.page_size = parse_number("EDUCHUB_PAGE_SIZE", &size)?;
        }
        if let Some(secs) = lookup("EDUCHUB_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("EDUCHUB_TIMEOUT_SECS", &secs)?;
        }
        if let Some(mode) = lookup("EDUCHUB_PAGINATION") {
            self.pagination_mode = match mode.trim().to_lowercase().as_str() {
                "client" => PaginationMode::Client,
                "server" => PaginationMode::Server,
                other => {
                    return Err(AppError::Config(format!(
                        "EDUCHUB_PAGINATION must be 'client' or 'server', got '{}'",
                        other
                    )))
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::Config("api_base_url cannot be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(AppError::Config("page_size must be greater than zero".to_string()));
        }
        let (min, max) = SETTLE_RANGE_MS;
        if !(min..=max).contains(&self.settle_interval_ms) {
            return Err(AppError::Config(format!(
                "settle_interval_ms must be between {} and {}, got {}",
                min, max, self.settle_interval_ms
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, raw)))
}
