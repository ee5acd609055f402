//! Error types shared by the picker, the backend client and the config loader

use std::path::PathBuf;

/// Failure of a catalog search. Every variant is recoverable: the picker
/// leaves the searching state and offers a retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search timed out after {0} seconds")]
    Timeout(u64),
    #[error("search request failed: {0}")]
    Transport(String),
    #[error("search endpoint answered with status {0}")]
    Status(u16),
    #[error("could not read search response: {0}")]
    Decode(String),
}

impl SearchError {
    /// Classify a reqwest failure.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            SearchError::Timeout(timeout_secs)
        } else if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            SearchError::Status(status.as_u16())
        } else {
            SearchError::Transport(err.to_string())
        }
    }
}

/// Failure of a mutating call (host form submission, reservation changes).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("could not read response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
}

/// A locally authored row was rejected by a list editor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListEditError {
    #[error("value for {0} must not be empty")]
    EmptyValue(String),
    #[error("{value:?} is not a valid value for {field}")]
    Invalid { field: String, value: String },
    #[error("expected {expected} values, got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("no such row")]
    UnknownRow,
}
