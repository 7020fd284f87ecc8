use std::io::Write;
use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use homehub::logging::{self, LoggingMode};
use homehub::{HaError, HaResult, HubError, Message, PublishOptions, QoS, RequestOptions};

/// Query a Home Assistant hub and talk to its MQTT broker
#[derive(Parser, Debug)]
#[command(name = "homehub")]
#[command(version)]
struct Args {
    /// Env file with HASS_TOKEN / HASS_HOST / MQTT_ENDPOINT
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Log every request and connection event to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GET /<base-path>/<segments...> and print the normalized result
    Get {
        #[arg(required = true)]
        segments: Vec<String>,

        #[arg(long, default_value = "api")]
        base_path: String,

        /// Print the decoded body as-is; write JPEG bytes to stdout
        #[arg(long)]
        raw: bool,

        /// Store a JPEG response here instead of a temporary file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Publish a payload to a topic
    Publish {
        topic: String,
        payload: String,

        /// Parse the payload as JSON and send it re-encoded
        #[arg(long)]
        json: bool,

        #[arg(long)]
        retain: bool,

        /// QoS level (0, 1 or 2)
        #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=2))]
        qos: u8,
    },
    /// Print every message on a topic until interrupted
    Subscribe {
        topic: String,

        /// Print payloads as text instead of decoding JSON
        #[arg(long)]
        raw: bool,
    },
    /// Show the resolved hub and broker settings (never the token)
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        logging::init_logging(LoggingMode::Debug)?;
    } else {
        logging::init_logging_from_env()?;
    }

    let config = homehub::init_or_exit(args.env_file.as_deref());

    if let Err(err) = run(args.command) {
        // Transport failures go to the error sink
        if let Some(report) = err.downcast_ref::<HaError>().and_then(HaError::report) {
            report.exit();
        }
        return Err(err.context(format!("hub {}", config.host())));
    }
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Get {
            segments,
            base_path,
            raw,
            output,
        } => {
            let mut options = RequestOptions::new().base_path(base_path).raw(raw);
            if let Some(output) = output {
                options = options.output_file(output);
            }
            let result = homehub::ha()?.request(&segments, &options)?;
            print_result(&result);
            Ok(())
        }
        Command::Publish {
            topic,
            payload,
            json,
            retain,
            qos,
        } => {
            let mut options = PublishOptions::default().with_qos(qos_level(qos));
            if retain {
                options = options.retained();
            }

            let mut mqtt = homehub::mqtt()?;
            let sent = if json {
                let value: serde_json::Value =
                    serde_json::from_str(&payload).context("payload is not valid JSON")?;
                mqtt.publish(&topic, options, Some(|| value))?
                    .map(|v| v.to_string())
            } else {
                mqtt.publish(&topic, options, Some(|| payload))?
            };
            mqtt.close()?;

            if let Some(sent) = sent {
                println!("{} <- {}", topic, sent);
            }
            Ok(())
        }
        Command::Subscribe { topic, raw } => {
            let mut mqtt = homehub::mqtt()?;
            mqtt.subscribe(&topic, !raw, |topic, message| {
                match message {
                    Message::Json(value) => println!("{} {}", topic, value),
                    Message::Text(text) => println!("{} {}", topic, text),
                }
                ControlFlow::Continue(())
            })?;
            Ok(())
        }
        Command::Config => {
            let config = homehub::config().ok_or(HubError::NotInitialized)?;
            println!("host          {}", config.host());
            println!("api           {}", config.uri(["api"])?);
            println!("mqtt endpoint {}", config.mqtt_endpoint());
            Ok(())
        }
    }
}

fn print_result(result: &HaResult) {
    match result {
        HaResult::Bytes(bytes) => {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(bytes);
            let _ = stdout.flush();
        }
        HaResult::Image(image) => println!("{}", image.path().display()),
        other => {
            if let Some(json) = other.to_json() {
                match serde_json::to_string_pretty(&json) {
                    Ok(text) => println!("{}", text),
                    Err(_) => println!("{}", json),
                }
            }
        }
    }
}

fn qos_level(level: u8) -> QoS {
    match level {
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}
