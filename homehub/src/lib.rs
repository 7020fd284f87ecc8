//! # homehub - Home Assistant over REST and MQTT
//!
//! One configuration, two clients:
//!
//! ```rust,no_run
//! use std::ops::ControlFlow;
//!
//! fn main() -> Result<(), homehub::HubError> {
//!     // Resolve HASS_TOKEN / HASS_HOST / MQTT_ENDPOINT once per process
//!     homehub::init(None)?;
//!
//!     let ha = homehub::ha()?;
//!     let temperature = ha.state("sensor.temperature")?;
//!     if let Some(state) = temperature.as_state() {
//!         println!("temperature: {:?}", state.state()); // "21°C"
//!     }
//!
//!     let mut mqtt = homehub::mqtt()?;
//!     mqtt.publish("home/heartbeat", homehub::PublishOptions::default(), Some(|| "alive"))?;
//!     mqtt.subscribe("home/#", true, |topic, message| {
//!         println!("{}: {:?}", topic, message);
//!         ControlFlow::Continue(())
//!     })?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! homehub (process-wide config, logging, CLI)
//!     ↓                      ↓
//! ha-client (REST)      mqtt-client (pub/sub)
//!     ↓                      ↓
//!        hub-config (env + env file)
//! ```
//!
//! Everything is blocking and single-threaded. `subscribe` holds its thread until the
//! connection ends; give it a thread of its own when the process has other work.

use std::path::Path;
use std::sync::OnceLock;

pub use error::HubError;
pub use ha_client::{HaClient, HaError, HaResult, ImageFile, RequestOptions, StateResult};
pub use hub_config::{ConfigError, Configuration, Endpoint, ErrorReport};
pub use hub_mqtt::{Json, Message, MqttClient, MqttError, Payload, PublishOptions, QoS, Stopper};

pub mod logging;
mod error;

static CONFIG: OnceLock<Configuration> = OnceLock::new();

/// Resolve the process-wide configuration.
///
/// The first successful call wins; later calls return the stored value and ignore
/// `env_file`.
pub fn init(env_file: Option<&Path>) -> Result<&'static Configuration, HubError> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    let resolved = Configuration::resolve(env_file)?;
    Ok(CONFIG.get_or_init(|| resolved))
}

/// Like [`init`], but a configuration failure (most importantly a missing token) ends
/// the process through the error sink.
pub fn init_or_exit(env_file: Option<&Path>) -> &'static Configuration {
    match init(env_file) {
        Ok(config) => config,
        Err(e) => {
            let target = env_file
                .map(|p| p.display().to_string())
                .or_else(|| std::env::var(hub_config::ENV_FILE_VAR).ok())
                .unwrap_or_else(|| hub_config::DEFAULT_ENV_FILE.to_string());
            let report = ErrorReport::new("config", "homehub", target, e.to_string());
            report.emit();
            report.exit()
        }
    }
}

/// The process-wide configuration, if [`init`] has succeeded
pub fn config() -> Option<&'static Configuration> {
    CONFIG.get()
}

/// HA client bound to the process-wide configuration
pub fn ha() -> Result<HaClient, HubError> {
    let config = config().ok_or(HubError::NotInitialized)?;
    Ok(HaClient::new(config.clone()))
}

/// MQTT client for the process-wide broker endpoint; connects on first use
pub fn mqtt() -> Result<MqttClient, HubError> {
    let config = config().ok_or(HubError::NotInitialized)?;
    Ok(MqttClient::from_config(config)?)
}
