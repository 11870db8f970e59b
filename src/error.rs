// error.rs — 错误类型

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a motion sensor source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("device motion is not available")]
    Unavailable,
    #[error("device motion error: {0}")]
    Stream(String),
    #[error("device motion source disconnected")]
    Disconnected,
    #[error("device motion source has no more samples")]
    Exhausted,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown value {value:?} for {key}")]
    UnknownValue { key: &'static str, value: String },
}
