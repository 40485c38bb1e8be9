use thiserror::Error;

use crate::grid::GridError;

#[derive(Debug, Error)]
pub enum AutofabError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("A job scan is already running")]
    ScanInProgress,

    #[error("System of record error: {0}")]
    Source(#[from] SourceError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised while talking to the job-tracking system of record.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Lookup timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),
}
