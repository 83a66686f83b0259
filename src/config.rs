//! Application settings, read from `config.toml` in the user's config
//! directory and overridable through environment variables.

use crate::database::RetryPolicy;
use crate::error::Result;
use crate::study::QueueOrder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DB_ENV: &str = "FLASHCONCARDS_DB";
pub const LOG_ENV: &str = "FLASHCONCARDS_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// env_logger filter, e.g. "info" or "flashconcards=debug".
    pub log_filter: String,
    pub shuffle_cards: bool,
    /// Fixed seed for reproducible card order.
    pub shuffle_seed: Option<u64>,
    /// Fill an empty database with a demo course.
    pub seed_sample_data: bool,
    pub save_retry: RetryPolicy,
    pub window_width: f32,
    pub window_height: f32,
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("flashconcards"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: data_dir().join("db.sqlite3"),
            log_filter: "info".to_string(),
            shuffle_cards: true,
            shuffle_seed: None,
            seed_sample_data: true,
            save_retry: RetryPolicy::default(),
            window_width: 640.0,
            window_height: 760.0,
        }
    }
}

impl AppConfig {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("flashconcards").join("config.toml"))
    }

    /// Reads settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the config file if there is one, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var(DB_ENV).filter(|p| !p.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(filter) = var(LOG_ENV).filter(|f| !f.is_empty()) {
            self.log_filter = filter;
        }
    }

    pub fn queue_order(&self) -> QueueOrder {
        if self.shuffle_cards {
            QueueOrder::Shuffled(self.shuffle_seed)
        } else {
            QueueOrder::AsGiven
        }
    }
}
