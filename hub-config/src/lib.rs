//! Connection settings for homehub clients
//!
//! Resolves the hub auth token, hub host and MQTT endpoint from environment variables,
//! falling back to a `KEY=VALUE` env file.
//!
//! ```no_run
//! use hub_config::Configuration;
//!
//! let config = Configuration::resolve(None)?;
//! println!("hub: {}", config.uri(["api", "states"])?);
//! println!("broker: {}:{}", config.mqtt_host(), config.mqtt_port()?);
//! # Ok::<(), hub_config::ConfigError>(())
//! ```
//!
//! # Resolution order
//!
//! For each of `HASS_TOKEN`, `HASS_HOST` and `MQTT_ENDPOINT`:
//!
//! 1. a value already in the environment wins (and if all three are set, the file is
//!    never read);
//! 2. otherwise the value from the env file is used and written back into the
//!    environment;
//! 3. host and MQTT endpoint fall back to defaults; a missing token is an error.

mod config;
mod endpoint;
mod env;
pub mod env_file;
mod error;
mod report;

pub use config::{
    Configuration, DEFAULT_ENV_FILE, DEFAULT_HOST, DEFAULT_MQTT_ENDPOINT, ENV_FILE_VAR, HOST_VAR,
    MQTT_ENDPOINT_VAR, REQUIRED_VARS, TOKEN_VAR,
};
pub use endpoint::{Endpoint, HTTPS_PORT};
pub use env::{Environment, MapEnv, ProcessEnv};
pub use error::{ConfigError, Result};
pub use report::{ErrorReport, EXIT_STATUS, REPORT_PREFIX};
