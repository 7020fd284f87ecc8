//! HA client tests against a local mock hub
//!
//! The mock server listens on plain HTTP at a random port, so the configured host carries
//! that port and the client picks `http://`.

use ha_client::{HaClient, HaError, HaResult, RequestOptions};
use hub_config::Configuration;
use mockito::{Matcher, Server, ServerGuard};
use rstest::rstest;
use serde_json::json;

const TOKEN: &str = "test-token";

fn client_for(server: &ServerGuard) -> HaClient {
    let config = Configuration::new(TOKEN, server.host_with_port(), "127.0.0.1:1883")
        .expect("valid configuration");
    HaClient::new(config)
}

#[test]
fn test_json_state_is_enhanced() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/states/sensor.temperature")
        .match_header("authorization", "Bearer test-token")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"entity_id":"sensor.temperature","state":"21","attributes":{"unit_of_measurement":"°C"}}"#)
        .create();

    let result = client_for(&server).state("sensor.temperature").unwrap();
    mock.assert();

    let state = result.as_state().expect("enhanced JSON result");
    assert_eq!(state.state(), Some(&json!("21°C")));
    assert_eq!(state["entity_id"], json!("sensor.temperature"));
}

#[test]
fn test_raw_json_is_not_enhanced() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/states/sensor.temperature")
        .with_status(200)
        .with_header("content-type", "application/json; charset=utf-8")
        .with_body(r#"{"state":"21","attributes":{"unit_of_measurement":"°C"}}"#)
        .create();

    let result = client_for(&server)
        .request(
            ["states", "sensor.temperature"],
            &RequestOptions::new().raw(true),
        )
        .unwrap();

    assert_eq!(
        result,
        HaResult::Json(json!({"state": "21", "attributes": {"unit_of_measurement": "°C"}}))
    );
}

#[test]
fn test_json_array_passes_through() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/states")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"state":"on"},{"state":"off"}]"#)
        .create();

    let result = client_for(&server).get(["states"]).unwrap();
    assert_eq!(
        result.to_json(),
        Some(json!([{"state": "on"}, {"state": "off"}]))
    );
}

#[test]
fn test_custom_base_path() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/auth/providers")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create();

    client_for(&server)
        .request(["providers"], &RequestOptions::new().base_path("auth"))
        .unwrap();
    mock.assert();
}

#[rstest]
#[case(200)]
#[case(401)]
#[case(500)]
fn test_malformed_json_reports_status_and_body(#[case] status: usize) {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/states/sensor.broken")
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body("not json {")
        .create();

    match client_for(&server).state("sensor.broken") {
        Err(HaError::Decode {
            status: got, body, ..
        }) => {
            assert_eq!(got as usize, status);
            assert_eq!(body, "not json {");
        }
        other => panic!("Expected HaError::Decode, got {:?}", other),
    }
}

#[test]
fn test_error_status_with_json_body_is_normalized() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/states/sensor.missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Entity not found."}"#)
        .create();

    let result = client_for(&server).state("sensor.missing").unwrap();
    assert_eq!(
        result.to_json(),
        Some(json!({"message": "Entity not found."}))
    );
}

#[test]
fn test_jpeg_written_to_temp_file() {
    let bytes: Vec<u8> = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0xFF, 0xD9];
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/camera_proxy/camera.front")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(&bytes)
        .create();

    let result = client_for(&server)
        .get(["camera_proxy", "camera.front"])
        .unwrap();

    let image = result.as_image().expect("image result");
    assert!(image.is_temporary());
    assert_eq!(image.read().unwrap(), bytes);
    assert_eq!(
        result.to_json(),
        Some(json!({"output_file": image.path().display().to_string()}))
    );

    std::fs::remove_file(image.path()).unwrap();
}

#[test]
fn test_jpeg_written_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("front.jpg");
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/camera_proxy/camera.front")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body([1u8, 2, 3])
        .create();

    let result = client_for(&server)
        .request(
            ["camera_proxy", "camera.front"],
            &RequestOptions::new().output_file(&output),
        )
        .unwrap();

    let image = result.as_image().expect("image result");
    assert_eq!(image.path(), output);
    assert!(!image.is_temporary());
    assert_eq!(std::fs::read(&output).unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_raw_jpeg_returns_bytes_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.jpg");
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/camera_proxy/camera.front")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body([9u8, 8, 7])
        .create();

    let result = client_for(&server)
        .request(
            ["camera_proxy", "camera.front"],
            &RequestOptions::new().raw(true).output_file(&output),
        )
        .unwrap();

    assert_eq!(result, HaResult::Bytes(vec![9, 8, 7]));
    assert!(!output.exists());
}

#[rstest]
#[case("text/plain")]
#[case("text/html")]
#[case("image/png")]
fn test_unsupported_content_type(#[case] content_type: &str) {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/")
        .with_status(200)
        .with_header("content-type", content_type)
        .with_body("API running.")
        .create();

    match client_for(&server).get([""]) {
        Err(HaError::UnsupportedContentType {
            status,
            content_type: got,
        }) => {
            assert_eq!(status, 200);
            assert_eq!(got, content_type);
        }
        other => panic!("Expected UnsupportedContentType, got {:?}", other),
    }
}

#[test]
fn test_segments_are_not_escaped() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/history/period")
        .match_query(Matcher::UrlEncoded(
            "filter_entity_id".into(),
            "sensor.temperature".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create();

    client_for(&server)
        .get(["history", "period?filter_entity_id=sensor.temperature"])
        .unwrap();
    mock.assert();
}

#[test]
fn test_connection_refused_is_transport_failure() {
    // Port 1 on loopback is never listening in test environments
    let config = Configuration::new(TOKEN, "127.0.0.1:1", "127.0.0.1:1883").unwrap();
    let client = HaClient::new(config);

    match client.state("sensor.temperature") {
        Err(err @ HaError::Transport(_)) => {
            let report = err.report().unwrap();
            assert_eq!(report.kind, "transport");
            assert_eq!(report.source, "ha");
            assert_eq!(
                report.target,
                "http://127.0.0.1:1/api/states/sensor.temperature"
            );
            assert!(err.status().is_none());
        }
        other => panic!("Expected HaError::Transport, got {:?}", other),
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_debug_trace_line_names_request() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/states/sensor.temperature")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"state":"21"}"#)
        .create();
    let client = client_for(&server);

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        client.state("sensor.temperature").unwrap();
    });

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let line = output
        .lines()
        .find(|line| line.contains(r#"kind="request""#))
        .unwrap_or_else(|| panic!("no request trace line in:\n{}", output));
    assert!(line.contains("DEBUG"), "{}", line);
    assert!(line.contains(r#"source="ha""#), "{}", line);
    assert!(line.contains(r#"host="127.0.0.1""#), "{}", line);
    assert!(line.contains("path=api/states/sensor.temperature"), "{}", line);
}

#[test]
fn test_no_trace_line_above_debug() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/api/states/sun.sun")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"state":"above_horizon"}"#)
        .create();
    let client = client_for(&server);

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || client.state("sun.sun"));

    assert!(result.is_ok());
    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(!output.contains(r#"kind="request""#), "{}", output);
}
