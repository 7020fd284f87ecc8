//! Basic usage of the homehub facade
//!
//! This example walks through the three things the facade does:
//! - init() - Resolve the token, host and broker once per process
//! - ha() - Read an entity state over the REST API
//! - mqtt() - Publish a payload, then watch a topic for a few messages
//!
//! Run with: cargo run -p homehub --example basic_usage -- sensor.temperature

use std::ops::ControlFlow;

use homehub::{HubError, Json, PublishOptions};
use serde_json::json;

const MESSAGES_TO_WATCH: usize = 3;

fn main() -> Result<(), HubError> {
    homehub::logging::init_logging_from_env()?;

    println!("homehub - Basic Usage Example");
    println!("=============================");

    let config = homehub::init(None)?;
    println!("Hub:    {}", config.host());
    println!("Broker: {}", config.mqtt_endpoint());

    let entity = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sun.sun".to_string());

    // REST: the state comes back with its unit of measurement appended
    println!("\nState of {}:", entity);
    let ha = homehub::ha()?;
    match ha.state(&entity) {
        Ok(result) => match result.as_state() {
            Some(state) => {
                println!("   state: {:?}", state.state());
                println!("   value: {:?}", state.value());
                println!("   on:    {}", state.is_true());
            }
            None => println!("   {:?}", result.to_json()),
        },
        Err(e) => println!("   Error reading state: {}", e),
    }

    // MQTT: the connection opens on the first publish
    println!("\nPublishing heartbeat:");
    let mut mqtt = homehub::mqtt()?;
    let sent = mqtt.publish(
        "homehub/example/heartbeat",
        PublishOptions::default(),
        Some(|| Json(json!({"entity": entity, "alive": true}))),
    )?;
    if let Some(Json(payload)) = sent {
        println!("   sent {}", payload);
    }

    println!("\nWatching homehub/example/# for {} messages...", MESSAGES_TO_WATCH);
    let mut seen = 0;
    mqtt.subscribe("homehub/example/#", true, |topic, message| {
        seen += 1;
        println!("   [{}] {}: {:?}", seen, topic, message);
        if seen >= MESSAGES_TO_WATCH {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;

    mqtt.close()?;
    println!("\nDone");
    Ok(())
}
