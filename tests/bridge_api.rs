//! End-to-end tests: the full API served over a real socket, driven by a
//! real HTTP client, with the speed probes pointed at a local file server.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use netgauge::api::state::AppState;
use netgauge::config::{Config, ProbeConfig};
use netgauge::net::{LinkProbe, NetworkType};
use netgauge::service::SpeedService;

struct StaticLink;

#[async_trait]
impl LinkProbe for StaticLink {
    async fn network_type(&self) -> NetworkType {
        NetworkType::Wifi
    }
    async fn download_capability_mbps(&self) -> f64 {
        300.0
    }
    async fn upload_capability_mbps(&self) -> f64 {
        100.0
    }
    async fn signal_level(&self) -> i32 {
        4
    }
}

/// File endpoint for the speed probes to hit.
async fn spawn_file_server() -> SocketAddr {
    let app = Router::new().route("/file", get(|| async { vec![0u8; 128 * 1024] }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Bring up the netgauge API over a real socket with the given config.
async fn spawn_api(config: Config) -> SocketAddr {
    let service = SpeedService::with_link_probe(&config, Arc::new(StaticLink));
    let app = netgauge::api::router(AppState {
        service: Arc::new(service),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn local_probe_config(file_url: &str) -> Config {
    Config {
        probe: ProbeConfig {
            download_url: file_url.to_string(),
            fallback_url: file_url.to_string(),
            upload_url: file_url.to_string(),
            connect_timeout_ms: 2_000,
            request_timeout_ms: 5_000,
            ..ProbeConfig::default()
        },
        ..Config::default()
    }
}

#[tokio::test]
async fn test_health_over_tcp() {
    let file_addr = spawn_file_server().await;
    let api_addr = spawn_api(local_probe_config(&format!("http://{file_addr}/file"))).await;

    let body: Value = reqwest::get(format!("http://{api_addr}/api/v1/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_snapshot_route_over_tcp() {
    let file_addr = spawn_file_server().await;
    let api_addr = spawn_api(local_probe_config(&format!("http://{file_addr}/file"))).await;

    let body: Value = reqwest::get(format!("http://{api_addr}/api/v1/network/snapshot"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["data"]["networkType"], "wifi");
    assert_eq!(body["data"]["downloadMbps"], 300.0);
    assert_eq!(body["data"]["uploadMbps"], 100.0);
    assert_eq!(body["data"]["signalStrength"], 4);
}

#[tokio::test]
async fn test_full_stack_download_test_via_bridge() {
    let file_addr = spawn_file_server().await;
    let file_url = format!("http://{file_addr}/file");
    let api_addr = spawn_api(local_probe_config(&file_url)).await;

    let reply: Value = reqwest::Client::new()
        .post(format!("http://{api_addr}/api/v1/call"))
        .json(&json!({
            "request_id": "e2e-1",
            "call": { "method": "runDownloadSpeedTest", "testFileUrl": file_url }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(reply["request_id"], "e2e-1");
    assert_eq!(reply["reply"]["kind"], "mbps");
    assert!(reply["reply"]["value"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_full_stack_upload_test_via_bridge() {
    let file_addr = spawn_file_server().await;
    let file_url = format!("http://{file_addr}/file");
    let api_addr = spawn_api(local_probe_config(&file_url)).await;

    let reply: Value = reqwest::Client::new()
        .post(format!("http://{api_addr}/api/v1/call"))
        .json(&json!({
            "request_id": "e2e-2",
            "call": { "method": "runUploadSpeedTest" }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(reply["request_id"], "e2e-2");
    assert_eq!(reply["reply"]["kind"], "mbps");
    assert!(reply["reply"]["value"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_speed_test_route_uses_configured_default_target() {
    let file_addr = spawn_file_server().await;
    let api_addr = spawn_api(local_probe_config(&format!("http://{file_addr}/file"))).await;

    // Empty body selects the configured default target.
    let reply: Value = reqwest::Client::new()
        .post(format!("http://{api_addr}/api/v1/speed-test/download"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(reply["data"]["mbps"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_upload_route_failure_reports_sentinel() {
    // Point the upload target at a port nothing listens on.
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/")
    };

    let config = Config {
        probe: ProbeConfig {
            download_url: dead.clone(),
            fallback_url: dead.clone(),
            upload_url: dead,
            upload_payload_bytes: 4096,
            connect_timeout_ms: 1_000,
            request_timeout_ms: 2_000,
        },
        ..Config::default()
    };
    let api_addr = spawn_api(config).await;

    let reply: Value = reqwest::Client::new()
        .post(format!("http://{api_addr}/api/v1/speed-test/upload"))
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Failure arrives as a 200 carrying the sentinel, not an error shape.
    assert_eq!(reply["data"]["mbps"], 0.0);
}

#[tokio::test]
async fn test_bridge_capability_calls_over_tcp() {
    let file_addr = spawn_file_server().await;
    let api_addr = spawn_api(local_probe_config(&format!("http://{file_addr}/file"))).await;
    let client = reqwest::Client::new();

    let reply: Value = client
        .post(format!("http://{api_addr}/api/v1/call"))
        .json(&json!({ "request_id": "cap-1", "call": { "method": "getDownloadSpeed" } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["reply"]["kind"], "mbps");
    assert_eq!(reply["reply"]["value"], 300.0);

    let reply: Value = client
        .post(format!("http://{api_addr}/api/v1/call"))
        .json(&json!({ "request_id": "cap-2", "call": { "method": "getCurrentNetworkSpeed" } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["reply"]["kind"], "snapshot");
    assert_eq!(reply["reply"]["value"]["signalStrength"], 4);
}
