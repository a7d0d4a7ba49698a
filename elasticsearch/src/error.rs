use thiserror::Error;

/// Failures building an [`crate::ElasticsearchBackend`]. Query-time failures
/// are reported as `logreader_window::BackendError`.
#[derive(Debug, Error)]
pub enum ElasticsearchError {
    #[error("invalid elasticsearch configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid elasticsearch url: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ElasticsearchError> = std::result::Result<T, E>;
