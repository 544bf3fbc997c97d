use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::listing::PAGE_SIZE;
use crate::navigation::DEFAULT_RESTORE_DELAY;

const APP_DIR: &str = "insights-reader";
const CONFIG_FILE: &str = "config.toml";

/// Reader settings, loaded from `config.toml` and then environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the hosted table REST API
    pub api_url: String,
    pub base_id: Option<String>,
    pub api_key: Option<String>,
    pub articles_table: String,
    pub request_timeout_secs: u64,
    pub page_size: usize,
    pub scroll_restore_delay_ms: u64,
    pub dark_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.airtable.com/v0".to_string(),
            base_id: None,
            api_key: None,
            articles_table: "Articles".to_string(),
            request_timeout_secs: 60,
            page_size: PAGE_SIZE,
            scroll_restore_delay_ms: DEFAULT_RESTORE_DELAY.as_millis() as u64,
            dark_mode: true,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Environment wins over the file. The lookup is injected so tests do
    /// not touch the process environment.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("AIRTABLE_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(base) = var("AIRTABLE_BASE_ID") {
            self.base_id = Some(base);
        }
        if let Some(table) = var("AIRTABLE_ARTICLES_TABLE") {
            self.articles_table = table;
        }
        if let Some(url) = var("INSIGHTS_API_URL") {
            self.api_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_id.as_deref().map_or(true, str::is_empty) {
            return Err(anyhow!("base_id is not set (config file or AIRTABLE_BASE_ID)"));
        }
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(anyhow!("api_key is not set (config file or AIRTABLE_API_KEY)"));
        }
        if self.articles_table.trim().is_empty() {
            return Err(anyhow!("articles_table must not be empty"));
        }
        if self.page_size == 0 {
            return Err(anyhow!("page_size must be at least 1"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scroll_restore_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_restore_delay_ms)
    }
}
