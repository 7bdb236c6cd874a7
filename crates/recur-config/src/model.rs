use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Settings shared by every host of the recurrence engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Where items, backups, and the journal live. Defaults to `<data dir>/recur`.
    pub data_dir: Option<PathBuf>,
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
    #[serde(default = "Config::default_upcoming_window_days")]
    pub upcoming_window_days: u32,
    /// Occurrences emitted per item in one generation pass.
    #[serde(default = "Config::default_max_catch_up")]
    pub max_catch_up: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_generation_interval_minutes: Option<u32>,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_filter: Self::default_log_filter(),
            upcoming_window_days: Self::default_upcoming_window_days(),
            max_catch_up: Self::default_max_catch_up(),
            min_generation_interval_minutes: None,
            backup_retention: Self::default_backup_retention(),
        }
    }
}

impl Config {
    pub fn default_log_filter() -> String {
        "recur_engine=info,recur_core=info,recur_storage_json=info".into()
    }

    pub fn default_upcoming_window_days() -> u32 {
        30
    }

    pub fn default_max_catch_up() -> usize {
        1024
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("recur")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_catch_up == 0 {
            return Err(ConfigError::Invalid(
                "max_catch_up must be at least 1".into(),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid("log_filter must not be empty".into()));
        }
        Ok(())
    }
}
