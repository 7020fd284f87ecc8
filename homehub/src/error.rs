use hub_config::{ConfigError, ErrorReport};
use thiserror::Error;

use crate::logging::LoggingError;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HA error: {0}")]
    Ha(#[from] ha_client::HaError),

    #[error("MQTT error: {0}")]
    Mqtt(#[from] hub_mqtt::MqttError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Configuration not initialized; call homehub::init first")]
    NotInitialized,
}

impl HubError {
    /// The structured report for errors that end up in the error sink
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            HubError::Ha(e) => e.report(),
            _ => None,
        }
    }
}
