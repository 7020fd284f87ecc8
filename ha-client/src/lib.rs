//! Blocking client for the Home Assistant REST API
//!
//! Issues authenticated `GET` requests against the hub and normalizes the response by
//! its declared content type:
//!
//! - `application/json` is decoded and, unless raw mode is requested, wrapped in a
//!   [`StateResult`] that folds the unit of measurement into `state`;
//! - `image/jpeg` is written to a caller-chosen or temporary file ([`ImageFile`]), or
//!   returned as bytes in raw mode;
//! - anything else is [`HaError::UnsupportedContentType`].
//!
//! ```no_run
//! use ha_client::HaClient;
//! use hub_config::Configuration;
//!
//! let client = HaClient::new(Configuration::resolve(None)?);
//! let temperature = client.state("sensor.temperature")?;
//! if let Some(state) = temperature.as_state() {
//!     println!("{:?}", state.state());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Calls block until the hub answers. The client sets no timeouts and never retries: the
//! only limit is the 30 s connect timeout `ureq` applies by default, so a hub that accepts
//! the connection and then stalls blocks the calling thread. A failed call is reported once.

mod enhance;
mod error;
mod result;

pub use enhance::StateResult;
pub use error::{HaError, Result};
pub use result::{HaResult, ImageFile};

use std::io::Read;
use std::path::PathBuf;

use hub_config::{Configuration, ErrorReport};
use tracing::debug;

const DEFAULT_BASE_PATH: &str = "api";
const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_JPEG: &str = "image/jpeg";

/// Per-request knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    base_path: String,
    raw: bool,
    output_file: Option<PathBuf>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// First path segment, `api` by default
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Skip enhancement; JPEG payloads come back as bytes instead of a file
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Where to write a JPEG payload instead of a temporary file
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            raw: false,
            output_file: None,
        }
    }
}

/// A client bound to one hub configuration
#[derive(Debug, Clone)]
pub struct HaClient {
    agent: ureq::Agent,
    config: Configuration,
}

impl HaClient {
    /// Client with a default `ureq` agent: 30 s connect timeout, no read or write timeout
    pub fn new(config: Configuration) -> Self {
        Self::with_agent(config, ureq::AgentBuilder::new().build())
    }

    /// Use a preconfigured agent (proxy, TLS settings, ...)
    pub fn with_agent(config: Configuration, agent: ureq::Agent) -> Self {
        Self { agent, config }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// `GET /api/states/<entity_id>` with default options
    pub fn state(&self, entity_id: &str) -> Result<HaResult> {
        self.get(["states", entity_id])
    }

    /// `GET /api/<segments...>` with default options
    pub fn get<I, S>(&self, segments: I) -> Result<HaResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.request(segments, &RequestOptions::default())
    }

    /// Issue an authenticated `GET` for `<base_path>/<segments...>` and normalize the response.
    ///
    /// # Errors
    ///
    /// - [`HaError::Transport`] when no response arrived; the report is also logged
    /// - [`HaError::Decode`] when a JSON response does not parse
    /// - [`HaError::UnsupportedContentType`] for any content type but JSON and JPEG
    /// - [`HaError::Image`] when the JPEG payload cannot be written
    pub fn request<I, S>(&self, segments: I, options: &RequestOptions) -> Result<HaResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoint = self.config.ha_endpoint()?;
        let path: Vec<String> = std::iter::once(options.base_path.clone())
            .chain(segments.into_iter().map(|s| s.as_ref().to_string()))
            .collect();
        let uri = endpoint.uri(&path);

        debug!(
            kind = "request",
            source = "ha",
            host = endpoint.host(),
            path = %path.join("/"),
            "GET"
        );

        let response = match self
            .agent
            .get(&uri)
            .set("Authorization", &format!("Bearer {}", self.config.token()))
            .set("Content-Type", CONTENT_TYPE_JSON)
            .call()
        {
            Ok(response) => response,
            // Error statuses still carry a body worth normalizing
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(transport_failure(&uri, transport.to_string()))
            }
        };

        let status = response.status();
        let content_type = response.content_type().to_ascii_lowercase();

        match content_type.as_str() {
            CONTENT_TYPE_JSON => {
                let body = response
                    .into_string()
                    .map_err(|e| transport_failure(&uri, e.to_string()))?;
                let document = serde_json::from_str(&body).map_err(|source| HaError::Decode {
                    status,
                    body,
                    source,
                })?;

                Ok(if options.raw {
                    HaResult::Json(document)
                } else {
                    HaResult::State(StateResult::new(document))
                })
            }
            CONTENT_TYPE_JPEG => {
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut bytes)
                    .map_err(|e| transport_failure(&uri, e.to_string()))?;

                if options.raw {
                    Ok(HaResult::Bytes(bytes))
                } else {
                    ImageFile::store(&bytes, options.output_file.as_deref()).map(HaResult::Image)
                }
            }
            _ => Err(HaError::UnsupportedContentType {
                status,
                content_type,
            }),
        }
    }
}

fn transport_failure(uri: &str, message: String) -> HaError {
    let report = ErrorReport::new("transport", "ha", uri, message);
    report.emit();
    HaError::Transport(report)
}
