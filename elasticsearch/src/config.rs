use std::path::Path;
use std::time::Duration;

use logreader_window::RecordFields;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ElasticsearchError;

/// Where the log index lives and how its documents are shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Cluster base URL, e.g. `http://localhost:9200`.
    #[serde(default = "default_url")]
    pub url: String,

    /// Index names or patterns searched together.
    #[serde(default = "default_indices")]
    pub indices: Vec<String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub fields: RecordFields,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_indices() -> Vec<String> {
    vec!["logstash-*".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            indices: default_indices(),
            timeout_secs: default_timeout_secs(),
            fields: RecordFields::default(),
        }
    }
}

impl ElasticsearchConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("url must not be empty".to_string());
        }
        if self.indices.is_empty() || self.indices.iter().any(|index| index.trim().is_empty()) {
            return Err("indices must name at least one non-empty index".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be > 0".to_string());
        }
        for (name, value) in [
            ("fields.host", &self.fields.host),
            ("fields.file", &self.fields.file),
            ("fields.timestamp", &self.fields.timestamp),
            ("fields.offset", &self.fields.offset),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ElasticsearchError> {
        let config: Self = toml::from_str(text)?;
        config.validate().map_err(ElasticsearchError::InvalidConfig)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ElasticsearchError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
