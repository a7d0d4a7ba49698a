use thiserror::Error;

/// The selection store does not describe exactly one log stream.
///
/// These are user-actionable: the view renders empty with the reason and no
/// fetch is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no `{field}` filter selected; pick exactly one host")]
    MissingHost { field: String },

    #[error("no `{field}` filter selected; pick exactly one file")]
    MissingFile { field: String },

    #[error("{count} `{field}` filters selected, need exactly one")]
    AmbiguousHost { field: String, count: usize },

    #[error("{count} `{field}` filters selected, need exactly one")]
    AmbiguousFile { field: String, count: usize },

    #[error("cannot build an anchor: {reason}")]
    AmbiguousAnchor { reason: String },

    #[error("filter `{field}` has unusable value {value}")]
    InvalidValue { field: String, value: String },
}

/// Executing a query against the search backend failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("search request failed: {message}")]
    Transport { message: String },

    #[error("search backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("search backend rejected the query: {message}")]
    Query { message: String },

    #[error("malformed record in search response: {message}")]
    MalformedRecord { message: String },

    #[error("search backend unavailable: {message}")]
    Unavailable { message: String },
}

impl BackendError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn malformed_record(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Everything the engine reports to its consumer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid window configuration: {0}")]
    Invalid(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = WindowError> = std::result::Result<T, E>;
