//! Error types for configuration resolution

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The auth token could not be found in the environment or the env file
    #[error("no auth token: set {0} or add it to the env file")]
    MissingToken(&'static str),

    /// The env file exists but could not be read
    #[error("failed to read env file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `host:port` value carried a port that is not a number
    #[error("invalid port in endpoint '{0}'")]
    InvalidPort(String),
}

/// Convenience Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
