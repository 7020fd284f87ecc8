//! Error types for the HA client

use hub_config::{ConfigError, ErrorReport};
use thiserror::Error;

/// Errors that can occur while talking to the hub
#[derive(Debug, Error)]
pub enum HaError {
    /// Network failure before a response arrived (DNS, refused connection, TLS, ...)
    #[error("transport failure: {0}")]
    Transport(ErrorReport),

    /// Response declared `application/json` but the body did not parse
    #[error("invalid JSON from hub: HTTP {status} {body}")]
    Decode {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// Response content type is neither JSON nor JPEG
    #[error("unsupported content type '{content_type}' (HTTP {status})")]
    UnsupportedContentType { status: u16, content_type: String },

    /// Writing a JPEG payload to disk failed
    #[error("failed to store image: {0}")]
    Image(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl HaError {
    /// HTTP status of the response that caused this error, if one arrived
    pub fn status(&self) -> Option<u16> {
        match self {
            HaError::Decode { status, .. } | HaError::UnsupportedContentType { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// The structured report for transport failures
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            HaError::Transport(report) => Some(report),
            _ => None,
        }
    }
}

/// Convenience Result type alias for HA client operations.
pub type Result<T> = std::result::Result<T, HaError>;
