//! Outgoing payload encoding and incoming message decoding.

use rumqttc::QoS;
use serde::Serialize;
use serde_json::Value;

use crate::error::{MqttError, Result};

/// Something that can be sent as an MQTT payload.
///
/// Text and bytes go out verbatim; [`serde_json::Value`] and [`Json`] are JSON-encoded.
pub trait Payload {
    fn encode(&self) -> Result<Vec<u8>>;
}

impl Payload for str {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}

impl Payload for String {
    fn encode(&self) -> Result<Vec<u8>> {
        self.as_str().encode()
    }
}

impl Payload for [u8] {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl Payload for Vec<u8> {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }
}

impl Payload for Value {
    fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(MqttError::Encode)
    }
}

impl<P: Payload + ?Sized> Payload for &P {
    fn encode(&self) -> Result<Vec<u8>> {
        (**self).encode()
    }
}

/// Wrapper that JSON-encodes any serializable value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> Payload for Json<T> {
    fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(MqttError::Encode)
    }
}

/// Delivery options for a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    pub qos: QoS,
    pub retain: bool,
}

impl PublishOptions {
    pub fn retained(mut self) -> Self {
        self.retain = true;
        self
    }

    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }
}

/// A publish received from the broker, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// A decoded message handed to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Json(Value),
    Text(String),
}

impl Message {
    /// Decode `incoming` as JSON, or as (lossy UTF-8) text when `parse_json` is false
    pub fn decode(incoming: &Incoming, parse_json: bool) -> Result<Self> {
        if parse_json {
            serde_json::from_slice(&incoming.payload)
                .map(Message::Json)
                .map_err(|source| MqttError::Decode {
                    topic: incoming.topic.clone(),
                    source,
                })
        } else {
            Ok(Message::Text(
                String::from_utf8_lossy(&incoming.payload).into_owned(),
            ))
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Message::Json(value) => Some(value),
            Message::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            Message::Json(_) => None,
        }
    }
}
