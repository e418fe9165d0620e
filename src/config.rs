//! Configuration loading and management
//!
//! Handles parsing of `.mpdx-filter.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::controller::{DEFAULT_ROWS_PER_PAGE, DEFAULT_SEARCH_DEBOUNCE};

pub const CONFIG_FILE_NAME: &str = ".mpdx-filter.toml";

const MAX_ROWS_PER_PAGE: u32 = 1000;
const MAX_SEARCH_DEBOUNCE_MS: u64 = 60_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Account list the task queries run against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_list_id: Option<String>,

    /// Task list configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Task list configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Page size for the task list query
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: u32,

    /// Quiet period before search text is applied
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Route used for shareable links
    #[serde(default = "default_route")]
    pub route: String,
}

fn default_rows_per_page() -> u32 {
    DEFAULT_ROWS_PER_PAGE
}

fn default_search_debounce_ms() -> u64 {
    DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64
}

fn default_route() -> String {
    "/tasks".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            rows_per_page: default_rows_per_page(),
            search_debounce_ms: default_search_debounce_ms(),
            route: default_route(),
        }
    }
}

impl TasksConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.rows_per_page == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "tasks.rows_per_page must be > 0".to_string(),
            ));
        }
        if self.rows_per_page > MAX_ROWS_PER_PAGE {
            return Err(crate::error::Error::InvalidConfig(format!(
                "tasks.rows_per_page must be <= {MAX_ROWS_PER_PAGE}"
            )));
        }
        if self.search_debounce_ms > MAX_SEARCH_DEBOUNCE_MS {
            return Err(crate::error::Error::InvalidConfig(format!(
                "tasks.search_debounce_ms must be <= {MAX_SEARCH_DEBOUNCE_MS}"
            )));
        }
        if !self.route.starts_with('/') {
            return Err(crate::error::Error::InvalidConfig(format!(
                "tasks.route '{}' must start with '/'",
                self.route
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `dir`, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if let Some(id) = &self.account_list_id {
            if id.trim().is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "account_list_id cannot be empty".to_string(),
                ));
            }
        }
        self.tasks.validate()?;
        Ok(())
    }
}
