//! Error types for the MQTT client

use hub_config::ConfigError;
use thiserror::Error;

/// Errors that can occur while publishing or subscribing
#[derive(Debug, Error)]
pub enum MqttError {
    /// The request could not be queued; usually the connection is gone
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Connecting to the broker failed, or an established connection dropped
    #[error("MQTT connection error: {0}")]
    Connection(String),

    /// A message on `topic` was not valid JSON
    #[error("invalid JSON on topic {topic}: {source}")]
    Decode {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    /// A payload could not be serialized to JSON
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience Result type alias for MQTT operations.
pub type Result<T> = std::result::Result<T, MqttError>;
