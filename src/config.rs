use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub claude_api_key: Option<String>,

    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_minutes: u32,

    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    #[serde(default = "default_page_text_max_len")]
    pub page_text_max_len: usize,

    /// Entries published more than this many days ago are skipped at
    /// ingestion. None disables the cutoff.
    #[serde(default)]
    pub max_entry_age_days: Option<i64>,

    #[serde(default = "default_backfill_batch")]
    pub summary_backfill_batch: u32,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsflow");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("newsflow.db").to_string_lossy().to_string()
}

fn default_fetch_interval() -> u32 {
    5
}

fn default_retention_days() -> i64 {
    30
}

fn default_max_concurrent_fetches() -> usize {
    5
}

fn default_page_text_max_len() -> usize {
    5000
}

fn default_backfill_batch() -> u32 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            claude_api_key: None,
            fetch_interval_minutes: default_fetch_interval(),
            retention_days: default_retention_days(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            page_text_max_len: default_page_text_max_len(),
            max_entry_age_days: None,
            summary_backfill_batch: default_backfill_batch(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsflow")
            .join("config.toml")
    }
}
