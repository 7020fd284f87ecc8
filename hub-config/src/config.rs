//! Resolved connection settings shared by the HA and MQTT clients.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::endpoint::{Endpoint, HTTPS_PORT};
use crate::env::{Environment, ProcessEnv};
use crate::env_file;
use crate::error::{ConfigError, Result};

/// Bearer token for the hub API
pub const TOKEN_VAR: &str = "HASS_TOKEN";
/// Hub hostname, optionally with `:port`
pub const HOST_VAR: &str = "HASS_HOST";
/// MQTT broker as `host:port`
pub const MQTT_ENDPOINT_VAR: &str = "MQTT_ENDPOINT";
/// Overrides the location of the fallback env file
pub const ENV_FILE_VAR: &str = "HOMEHUB_ENV_FILE";

/// Variables looked up during resolution, in order
pub const REQUIRED_VARS: [&str; 3] = [TOKEN_VAR, HOST_VAR, MQTT_ENDPOINT_VAR];

pub const DEFAULT_ENV_FILE: &str = "/etc/nixos/res/hass_token.env";
pub const DEFAULT_HOST: &str = "homeassistant.local";
pub const DEFAULT_MQTT_ENDPOINT: &str = "192.168.1.3:1883";

const DEFAULT_MQTT_PORT: u16 = 1883;

/// Connection settings for the hub and the broker.
///
/// Built once by [`Configuration::resolve`] and not mutated afterwards; the `with_*`
/// methods return a modified copy.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    token: String,
    host: String,
    mqtt_endpoint: String,
}

impl Configuration {
    /// Build a configuration from explicit values.
    ///
    /// Returns [`ConfigError::MissingToken`] when `token` is empty.
    pub fn new(
        token: impl Into<String>,
        host: impl Into<String>,
        mqtt_endpoint: impl Into<String>,
    ) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(ConfigError::MissingToken(TOKEN_VAR));
        }
        Ok(Self {
            token,
            host: host.into(),
            mqtt_endpoint: mqtt_endpoint.into(),
        })
    }

    /// Resolve settings from the process environment and the fallback env file.
    ///
    /// `file_override` replaces the env file location for this call. Without it,
    /// `HOMEHUB_ENV_FILE` is consulted, then [`DEFAULT_ENV_FILE`].
    pub fn resolve(file_override: Option<&Path>) -> Result<Self> {
        Self::resolve_with(&mut ProcessEnv, file_override)
    }

    /// Resolve settings against an arbitrary [`Environment`].
    ///
    /// 1. If every variable in [`REQUIRED_VARS`] is already set, the env file is not read.
    /// 2. Otherwise the env file is parsed; for each variable an existing environment value
    ///    wins over the file value.
    /// 3. Values taken from the file are written back into `env`, so the next resolution
    ///    short-circuits at step 1.
    pub fn resolve_with<E: Environment>(env: &mut E, file_override: Option<&Path>) -> Result<Self> {
        if REQUIRED_VARS.iter().all(|var| env.get(var).is_some()) {
            debug!("all settings present in environment, skipping env file");
        } else {
            let path = env_file_path(env, file_override);
            if let Some(file_vars) = env_file::read(&path)? {
                debug!(path = %path.display(), keys = file_vars.len(), "loaded env file");
                for var in REQUIRED_VARS {
                    if env.get(var).is_some() {
                        continue;
                    }
                    if let Some(value) = file_vars.get(var) {
                        env.set(var, value);
                    }
                }
            }
        }

        let token = env
            .get(TOKEN_VAR)
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken(TOKEN_VAR))?;

        Ok(Self {
            token,
            host: env
                .get(HOST_VAR)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            mqtt_endpoint: env
                .get(MQTT_ENDPOINT_VAR)
                .unwrap_or_else(|| DEFAULT_MQTT_ENDPOINT.to_string()),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Hub host as configured, possibly including `:port`
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn mqtt_endpoint(&self) -> &str {
        &self.mqtt_endpoint
    }

    /// Copy of this configuration pointing at another hub
    pub fn with_host(&self, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..self.clone()
        }
    }

    /// Copy of this configuration pointing at another broker
    pub fn with_mqtt_endpoint(&self, endpoint: impl Into<String>) -> Self {
        Self {
            mqtt_endpoint: endpoint.into(),
            ..self.clone()
        }
    }

    /// Hub endpoint; port 443 unless the host carries one
    pub fn ha_endpoint(&self) -> Result<Endpoint> {
        Endpoint::parse(&self.host, HTTPS_PORT)
    }

    /// Full URI for `segments` on the hub. Segments are not escaped.
    pub fn uri<I, S>(&self, segments: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.ha_endpoint()?.uri(segments))
    }

    /// Broker host: the part of the MQTT endpoint before the first `:`
    pub fn mqtt_host(&self) -> &str {
        self.mqtt_endpoint
            .split_once(':')
            .map_or(self.mqtt_endpoint.as_str(), |(host, _)| host)
    }

    /// Broker port, parsed on demand
    pub fn mqtt_port(&self) -> Result<u16> {
        Ok(self.mqtt()?.port())
    }

    /// Broker endpoint, port 1883 when none is given
    pub fn mqtt(&self) -> Result<Endpoint> {
        Endpoint::parse(&self.mqtt_endpoint, DEFAULT_MQTT_PORT)
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("token", &"<redacted>")
            .field("host", &self.host)
            .field("mqtt_endpoint", &self.mqtt_endpoint)
            .finish()
    }
}

fn env_file_path<E: Environment>(env: &E, file_override: Option<&Path>) -> PathBuf {
    file_override
        .map(Path::to_path_buf)
        .or_else(|| env.get(ENV_FILE_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))
}
