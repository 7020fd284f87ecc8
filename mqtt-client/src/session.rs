//! Broker connections.
//!
//! [`Broker`] is the seam between [`MqttClient`](crate::MqttClient) and the network.
//! [`BrokerSession`] implements it over a `rumqttc` connection that is driven by a
//! dedicated thread; incoming publishes reach the caller through a channel.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hub_config::Endpoint;
use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet, QoS,
};
use tracing::{debug, info, trace, warn};

use crate::error::{MqttError, Result};
use crate::payload::{Incoming, PublishOptions};

const CLIENT_ID_PREFIX: &str = "homehub";
const KEEP_ALIVE: Duration = Duration::from_secs(30);
const REQUEST_CAPACITY: usize = 64;

// Brokers drop an older session when a new one reuses its client id
static SESSION_SEQ: AtomicUsize = AtomicUsize::new(0);

fn client_id() -> String {
    format!(
        "{}-{}-{}",
        CLIENT_ID_PREFIX,
        std::process::id(),
        SESSION_SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

/// An established broker connection
pub trait Broker {
    /// Queue a publish
    fn submit(&mut self, topic: &str, payload: Vec<u8>, options: PublishOptions) -> Result<()>;

    fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Block until the next publish arrives.
    ///
    /// Returns `None` once the connection has been closed on purpose, and an error when
    /// it dropped.
    fn next_message(&mut self) -> Option<Result<Incoming>>;

    /// Disconnect and release the connection
    fn close(&mut self) -> Result<()>;
}

/// Ends a running subscription from another thread
#[derive(Clone)]
pub struct Stopper {
    client: Client,
    stopped: Arc<AtomicBool>,
}

impl Stopper {
    /// Disconnect from the broker; a blocked `subscribe` then returns `Ok(())`
    pub fn stop(&self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        self.client.disconnect()?;
        Ok(())
    }
}

/// A `rumqttc` connection driven on its own thread
pub struct BrokerSession {
    client: Client,
    messages: mpsc::Receiver<Result<Incoming>>,
    stopped: Arc<AtomicBool>,
    driver: Option<JoinHandle<()>>,
}

impl BrokerSession {
    /// Connect to `endpoint` and wait for the broker to accept.
    ///
    /// There is no connect timeout: an unresponsive broker blocks this call.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        let mut options = MqttOptions::new(client_id(), endpoint.host(), endpoint.port());
        options.set_keep_alive(KEEP_ALIVE);

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        let (connected_tx, connected_rx) = mpsc::channel();
        let (message_tx, messages) = mpsc::channel();
        let stopped = Arc::new(AtomicBool::new(false));

        let driver = thread::Builder::new()
            .name("homehub-mqtt".to_string())
            .spawn({
                let stopped = Arc::clone(&stopped);
                move || drive(connection, connected_tx, message_tx, stopped)
            })
            .map_err(|e| MqttError::Connection(format!("failed to spawn driver: {}", e)))?;

        match connected_rx.recv() {
            Ok(Ok(())) => {
                info!(broker = %endpoint, "connected to MQTT broker");
                Ok(Self {
                    client,
                    messages,
                    stopped,
                    driver: Some(driver),
                })
            }
            Ok(Err(e)) => {
                let _ = driver.join();
                Err(e)
            }
            Err(_) => Err(MqttError::Connection(
                "connection closed before CONNACK".to_string(),
            )),
        }
    }

    pub fn stopper(&self) -> Stopper {
        Stopper {
            client: self.client.clone(),
            stopped: Arc::clone(&self.stopped),
        }
    }
}

impl Broker for BrokerSession {
    fn submit(&mut self, topic: &str, payload: Vec<u8>, options: PublishOptions) -> Result<()> {
        debug!(topic, bytes = payload.len(), "publish");
        self.client
            .publish(topic, options.qos, options.retain, payload)?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<()> {
        debug!(topic, "subscribe");
        self.client.subscribe(topic, QoS::AtMostOnce)?;
        Ok(())
    }

    fn next_message(&mut self) -> Option<Result<Incoming>> {
        // The driver drops its sender when it exits
        self.messages.recv().ok()
    }

    fn close(&mut self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        if let Err(e) = self.client.disconnect() {
            debug!(error = %e, "disconnect after connection already ended");
        }
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
        Ok(())
    }
}

impl Drop for BrokerSession {
    fn drop(&mut self) {
        if self.driver.is_some() {
            self.stopped.store(true, Ordering::SeqCst);
            let _ = self.client.disconnect();
        }
    }
}

fn drive(
    mut connection: Connection,
    connected: mpsc::Sender<Result<()>>,
    messages: mpsc::Sender<Result<Incoming>>,
    stopped: Arc<AtomicBool>,
) {
    let mut connected = Some(connected);

    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                let Some(tx) = connected.take() else {
                    continue;
                };
                if ack.code == ConnectReturnCode::Success {
                    let _ = tx.send(Ok(()));
                } else {
                    let _ = tx.send(Err(MqttError::Connection(format!(
                        "broker refused connection: {:?}",
                        ack.code
                    ))));
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let incoming = Incoming {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                if messages.send(Ok(incoming)).is_err() {
                    trace!("message dropped, session gone");
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) if stopped.load(Ordering::SeqCst) => {
                debug!("disconnect sent, stopping driver");
                break;
            }
            Ok(event) => trace!(?event, "mqtt event"),
            Err(e) => {
                if stopped.load(Ordering::SeqCst) {
                    debug!(error = %e, "connection closed after stop");
                    break;
                }
                warn!(error = %e, "MQTT connection failed");
                let err = MqttError::Connection(e.to_string());
                match connected.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(err));
                    }
                    None => {
                        let _ = messages.send(Err(err));
                    }
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ids_are_unique_per_session() {
        let first = client_id();
        let second = client_id();
        assert_ne!(first, second);
        assert!(first.starts_with(&format!("homehub-{}-", std::process::id())));
    }

    #[test]
    fn test_connect_refused_is_connection_error() {
        // Nothing listens on loopback port 1
        let endpoint = Endpoint::new("127.0.0.1", 1);
        match BrokerSession::connect(&endpoint) {
            Err(MqttError::Connection(_)) => {}
            Err(other) => panic!("Expected MqttError::Connection, got {:?}", other),
            Ok(_) => panic!("Expected connection to fail"),
        }
    }
}
