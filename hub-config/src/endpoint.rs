//! `host:port` endpoints and URI construction.

use std::fmt;

use crate::error::{ConfigError, Result};

/// Default HTTPS port. An endpoint on this port is addressed with `https://`.
pub const HTTPS_PORT: u16 = 443;

const HTTP_PORT: u16 = 80;

/// A network endpoint, parsed from `host` or `host:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host:port`, splitting once on the first `:`.
    ///
    /// When the value has no `:` (or nothing after it), `default_port` is used.
    pub fn parse(value: &str, default_port: u16) -> Result<Self> {
        match value.split_once(':') {
            Some((host, "")) => Ok(Self::new(host, default_port)),
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(value.to_string()))?;
                Ok(Self::new(host, port))
            }
            None => Ok(Self::new(value, default_port)),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// True when requests to this endpoint use TLS
    pub fn is_secure(&self) -> bool {
        self.port == HTTPS_PORT
    }

    /// `https://host` on 443, `http://host` on 80, `http://host:port` otherwise
    pub fn base_url(&self) -> String {
        match self.port {
            HTTPS_PORT => format!("https://{}", self.host),
            HTTP_PORT => format!("http://{}", self.host),
            port => format!("http://{}:{}", self.host, port),
        }
    }

    /// Join the base URL with `segments` using `/`.
    ///
    /// Segments are used verbatim: nothing is percent-encoded, so callers must pass
    /// segments that are already safe to put in a URL path.
    pub fn uri<I, S>(&self, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut uri = self.base_url();
        for segment in segments {
            uri.push('/');
            uri.push_str(segment.as_ref());
        }
        uri
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hub.lan", "hub.lan", 443)]
    #[case("hub.lan:8123", "hub.lan", 8123)]
    #[case("hub.lan:", "hub.lan", 443)]
    #[case("10.0.0.2:1883", "10.0.0.2", 1883)]
    fn test_parse(#[case] input: &str, #[case] host: &str, #[case] port: u16) {
        let endpoint = Endpoint::parse(input, HTTPS_PORT).unwrap();
        assert_eq!(endpoint.host(), host);
        assert_eq!(endpoint.port(), port);
    }

    #[test]
    fn test_parse_rejects_non_numeric_port() {
        match Endpoint::parse("hub.lan:abc", HTTPS_PORT) {
            Err(ConfigError::InvalidPort(value)) => assert_eq!(value, "hub.lan:abc"),
            other => panic!("Expected InvalidPort, got {:?}", other),
        }
    }

    #[rstest]
    #[case(443, "https://hub.lan/api/states")]
    #[case(80, "http://hub.lan/api/states")]
    #[case(8123, "http://hub.lan:8123/api/states")]
    fn test_uri_scheme_follows_port(#[case] port: u16, #[case] expected: &str) {
        let endpoint = Endpoint::new("hub.lan", port);
        assert_eq!(endpoint.uri(["api", "states"]), expected);
    }

    #[test]
    fn test_uri_does_not_escape_segments() {
        let endpoint = Endpoint::new("hub.lan", 443);
        assert_eq!(
            endpoint.uri(["api", "camera_proxy", "camera.front door?x=1"]),
            "https://hub.lan/api/camera_proxy/camera.front door?x=1"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Endpoint::new("broker", 1883).to_string(), "broker:1883");
    }
}
