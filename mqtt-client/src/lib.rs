//! Minimal MQTT publish/subscribe for homehub
//!
//! [`MqttClient`] connects lazily: the first `publish`, `submit` or `subscribe`
//! establishes the broker connection and every later call reuses it. A connection that
//! drops is not re-established; the next call reports the failure.
//!
//! ```no_run
//! use hub_mqtt::{MqttClient, PublishOptions};
//! use hub_config::Configuration;
//! use serde_json::json;
//! use std::ops::ControlFlow;
//!
//! let config = Configuration::resolve(None)?;
//! let mut mqtt = MqttClient::from_config(&config)?;
//!
//! let sent = mqtt.publish("home/lights/kitchen", PublishOptions::default(), Some(|| {
//!     json!({"state": "on"})
//! }))?;
//! println!("sent {:?}", sent);
//!
//! // Blocks this thread until the connection ends or the callback breaks
//! mqtt.subscribe("home/sensors/#", true, |topic, message| {
//!     println!("{}: {:?}", topic, message);
//!     ControlFlow::Continue(())
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod payload;
mod session;

pub use error::{MqttError, Result};
pub use payload::{Incoming, Json, Message, Payload, PublishOptions};
pub use rumqttc::QoS;
pub use session::{Broker, BrokerSession, Stopper};

use std::ops::ControlFlow;

use hub_config::{Configuration, Endpoint};
use tracing::info;

type Connector<B> = Box<dyn Fn(&Endpoint) -> Result<B> + Send>;

/// A publish/subscribe client owning at most one broker connection
pub struct MqttClient<B: Broker = BrokerSession> {
    endpoint: Endpoint,
    connector: Connector<B>,
    broker: Option<B>,
}

impl MqttClient<BrokerSession> {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_connector(endpoint, BrokerSession::connect)
    }

    /// Client for the broker named by `MQTT_ENDPOINT`
    pub fn from_config(config: &Configuration) -> Result<Self> {
        Ok(Self::new(config.mqtt()?))
    }

    /// Handle that stops a running [`subscribe`](Self::subscribe) from another thread.
    ///
    /// Connects if no connection exists yet.
    pub fn stopper(&mut self) -> Result<Stopper> {
        Ok(self.connection()?.stopper())
    }
}

impl<B: Broker> MqttClient<B> {
    /// Client that opens its connection with `connector`
    pub fn with_connector<F>(endpoint: Endpoint, connector: F) -> Self
    where
        F: Fn(&Endpoint) -> Result<B> + Send + 'static,
    {
        Self {
            endpoint,
            connector: Box::new(connector),
            broker: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.broker.is_some()
    }

    /// The broker connection, established on first use
    pub fn connection(&mut self) -> Result<&mut B> {
        let broker = match self.broker.take() {
            Some(broker) => broker,
            None => {
                info!(broker = %self.endpoint, "connecting to MQTT broker");
                (self.connector)(&self.endpoint)?
            }
        };
        Ok(self.broker.insert(broker))
    }

    /// Publish `payload` to `topic`
    pub fn submit<P>(&mut self, topic: &str, payload: &P, options: PublishOptions) -> Result<()>
    where
        P: Payload + ?Sized,
    {
        let bytes = payload.encode()?;
        self.connection()?.submit(topic, bytes, options)
    }

    /// Publish the payload built by `producer` and hand it back.
    ///
    /// With no producer nothing is sent, no connection is opened and `Ok(None)` is returned.
    pub fn publish<P, F>(
        &mut self,
        topic: &str,
        options: PublishOptions,
        producer: Option<F>,
    ) -> Result<Option<P>>
    where
        P: Payload,
        F: FnOnce() -> P,
    {
        let Some(producer) = producer else {
            return Ok(None);
        };
        let payload = producer();
        self.submit(topic, &payload, options)?;
        Ok(Some(payload))
    }

    /// Subscribe to `topic` and feed every message to `on_message`.
    ///
    /// This blocks the calling thread. It returns `Ok(())` when `on_message` breaks or
    /// the connection is closed through a [`Stopper`], and an error when the connection
    /// drops or a message fails to decode. Run it on a dedicated thread if the process
    /// has other work to do.
    pub fn subscribe<F>(&mut self, topic: &str, parse_json: bool, mut on_message: F) -> Result<()>
    where
        F: FnMut(&str, Message) -> ControlFlow<()>,
    {
        let broker = self.connection()?;
        broker.subscribe(topic)?;

        while let Some(incoming) = broker.next_message() {
            let incoming = incoming?;
            let message = Message::decode(&incoming, parse_json)?;
            if on_message(&incoming.topic, message).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Disconnect; the next call connects again
    pub fn close(&mut self) -> Result<()> {
        match self.broker.take() {
            Some(mut broker) => broker.close(),
            None => Ok(()),
        }
    }
}
