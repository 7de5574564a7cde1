use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the analyzer.
///
/// Undecodable bytes are not an error: they degrade to lossy decoding.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown encoding label `{label}`")]
    UnknownEncoding { label: String },

    #[error("invalid configuration file {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigSource,
    },

    #[error("failed to write report to {}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigSource {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LogError>;
