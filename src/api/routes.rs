//! API route definitions.
//!
//! Every route answers 200 with a `{ data, meta }` envelope, except the
//! bridge pass-through at `/call`, which answers in the bridge's own
//! envelope. Probe failures surface as the 0.0 sentinel inside a 200, never
//! as an HTTP error status.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::state::AppState;
use crate::bridge::{BridgeReply, BridgeRequest};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/network/type", get(network_type))
        .route("/network/download-speed", get(download_capability))
        .route("/network/upload-speed", get(upload_capability))
        .route("/network/snapshot", get(network_snapshot))
        .route("/speed-test/download", post(run_download_test))
        .route("/speed-test/upload", post(run_upload_test))
        .route("/call", post(bridge_call))
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn network_type(State(state): State<AppState>) -> Json<Value> {
    let network_type = state.service.current_network_type().await;
    Json(json!({
        "data": { "networkType": network_type },
        "meta": { "timestamp": chrono::Utc::now().to_rfc3339() }
    }))
}

async fn download_capability(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "data": { "mbps": state.service.link_download_mbps().await }
    }))
}

async fn upload_capability(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "data": { "mbps": state.service.link_upload_mbps().await }
    }))
}

async fn network_snapshot(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.service.network_snapshot().await;
    Json(json!({
        "data": snapshot,
        "meta": { "timestamp": chrono::Utc::now().to_rfc3339() }
    }))
}

/// Body for the active speed-test routes. The argument keeps its
/// method-channel name; an empty or absent body selects the default target.
#[derive(Debug, Default, Deserialize)]
struct SpeedTestBody {
    #[serde(rename = "testFileUrl", default)]
    test_file_url: Option<String>,
}

fn parse_speed_test_body(body: &Bytes) -> SpeedTestBody {
    if body.is_empty() {
        return SpeedTestBody::default();
    }
    serde_json::from_slice(body).unwrap_or_default()
}

async fn run_download_test(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let body = parse_speed_test_body(&body);
    let outcome = state
        .service
        .run_download_test(body.test_file_url.as_deref())
        .await;
    Json(json!({
        "data": { "mbps": outcome.mbps() },
        "meta": { "timestamp": chrono::Utc::now().to_rfc3339() }
    }))
}

async fn run_upload_test(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let body = parse_speed_test_body(&body);
    let outcome = state
        .service
        .run_upload_test(body.test_file_url.as_deref())
        .await;
    Json(json!({
        "data": { "mbps": outcome.mbps() },
        "meta": { "timestamp": chrono::Utc::now().to_rfc3339() }
    }))
}

/// Bridge pass-through: one method call in, one reply out, both in the
/// bridge envelope rather than the `{ data, meta }` shape.
async fn bridge_call(
    State(state): State<AppState>,
    Json(request): Json<BridgeRequest>,
) -> Json<BridgeReply> {
    Json(state.service.dispatch(request).await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
