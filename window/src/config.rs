use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Names of the selection-store filters the anchor is resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionFields {
    #[serde(default = "default_host_field")]
    pub host: String,
    #[serde(default = "default_file_field")]
    pub file: String,
    /// The dashboard stores the picked line's time under its own name so it
    /// does not collide with the global time filter.
    #[serde(default = "default_selection_timestamp_field")]
    pub timestamp: String,
    #[serde(default = "default_offset_field")]
    pub offset: String,
}

/// Names of the record fields the backend queries and sorts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    #[serde(default = "default_host_field")]
    pub host: String,
    #[serde(default = "default_file_field")]
    pub file: String,
    #[serde(default = "default_record_timestamp_field")]
    pub timestamp: String,
    #[serde(default = "default_offset_field")]
    pub offset: String,
}

/// Configuration for one log window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Records requested per page (initial load, load-more, goto).
    #[serde(default = "default_load_size")]
    pub load_size: usize,

    /// Records requested by each follow poll.
    #[serde(default = "default_follow_load_size")]
    pub follow_load_size: usize,

    /// Seconds between follow polls.
    #[serde(default = "default_follow_interval_secs")]
    pub follow_interval_secs: u64,

    /// Quiet period that coalesces selection changes into one refresh.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub selection: SelectionFields,

    #[serde(default)]
    pub record: RecordFields,
}

fn default_host_field() -> String {
    "host.raw".to_string()
}

fn default_file_field() -> String {
    "file.raw".to_string()
}

fn default_selection_timestamp_field() -> String {
    "log_timestamp".to_string()
}

fn default_record_timestamp_field() -> String {
    "@timestamp".to_string()
}

fn default_offset_field() -> String {
    "offset".to_string()
}

fn default_load_size() -> usize {
    1000
}

fn default_follow_load_size() -> usize {
    1000
}

fn default_follow_interval_secs() -> u64 {
    5
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for SelectionFields {
    fn default() -> Self {
        Self {
            host: default_host_field(),
            file: default_file_field(),
            timestamp: default_selection_timestamp_field(),
            offset: default_offset_field(),
        }
    }
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            host: default_host_field(),
            file: default_file_field(),
            timestamp: default_record_timestamp_field(),
            offset: default_offset_field(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            load_size: default_load_size(),
            follow_load_size: default_follow_load_size(),
            follow_interval_secs: default_follow_interval_secs(),
            debounce_ms: default_debounce_ms(),
            selection: SelectionFields::default(),
            record: RecordFields::default(),
        }
    }
}

impl WindowConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.load_size == 0 {
            return Err("load_size must be > 0".to_string());
        }
        if self.follow_load_size == 0 {
            return Err("follow_load_size must be > 0".to_string());
        }
        if self.follow_interval_secs == 0 {
            return Err("follow_interval_secs must be > 0".to_string());
        }
        if self.debounce_ms == 0 {
            return Err("debounce_ms must be > 0".to_string());
        }
        for (name, value) in [
            ("selection.host", &self.selection.host),
            ("selection.file", &self.selection.file),
            ("selection.timestamp", &self.selection.timestamp),
            ("selection.offset", &self.selection.offset),
            ("record.host", &self.record.host),
            ("record.file", &self.record.file),
            ("record.timestamp", &self.record.timestamp),
            ("record.offset", &self.record.offset),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Smaller pages and a faster follow cadence for busy, chatty files.
    pub fn live_tail() -> Self {
        Self {
            load_size: 200,
            follow_load_size: 500,
            follow_interval_secs: 1,
            ..Default::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn follow_interval(&self) -> Duration {
        Duration::from_secs(self.follow_interval_secs)
    }
}
