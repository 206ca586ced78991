//! The operation layer: one service owning the link probe and the speed
//! prober, plus the dispatch that binds the method-call surface to them.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bridge::{BridgeReply, BridgeRequest, MethodCall, MethodReply};
use crate::config::Config;
use crate::net::sys::SysLinkProbe;
use crate::net::{LinkProbe, NetworkSnapshot, NetworkType};
use crate::probe::{Direction, ProbeOutcome, Prober};

/// Everything a transport needs to answer the call surface.
///
/// Holds no measurement state. Link reads pass through to the [`LinkProbe`],
/// and every speed test runs as an independent one-shot probe.
pub struct SpeedService {
    link: Arc<dyn LinkProbe>,
    prober: Prober,
}

impl SpeedService {
    /// Build the service with the OS-backed link probe.
    pub fn new(config: &Config) -> Self {
        Self::with_link_probe(
            config,
            Arc::new(SysLinkProbe::new(config.link.interface.clone())),
        )
    }

    /// Build the service around a caller-supplied link probe.
    pub fn with_link_probe(config: &Config, link: Arc<dyn LinkProbe>) -> Self {
        Self {
            link,
            prober: Prober::new(config.probe.clone()),
        }
    }

    pub async fn current_network_type(&self) -> NetworkType {
        self.link.network_type().await
    }

    pub async fn link_download_mbps(&self) -> f64 {
        self.link.download_capability_mbps().await
    }

    pub async fn link_upload_mbps(&self) -> f64 {
        self.link.upload_capability_mbps().await
    }

    pub async fn network_snapshot(&self) -> NetworkSnapshot {
        self.link.snapshot().await
    }

    /// Run one measured download on a worker task and wait for its outcome.
    pub async fn run_download_test(&self, target_url: Option<&str>) -> ProbeOutcome {
        let request = self.prober.request(Direction::Download, target_url);
        info!(url = %request.target_url, "starting download speed test");
        let ticket = self.prober.spawn(request);
        let outcome = ticket.outcome().await;
        log_outcome(Direction::Download, &outcome);
        outcome
    }

    /// Run one measured upload on a worker task and wait for its outcome.
    pub async fn run_upload_test(&self, target_url: Option<&str>) -> ProbeOutcome {
        let request = self.prober.request(Direction::Upload, target_url);
        info!(url = %request.target_url, bytes = request.payload_bytes, "starting upload speed test");
        let ticket = self.prober.spawn(request);
        let outcome = ticket.outcome().await;
        log_outcome(Direction::Upload, &outcome);
        outcome
    }

    /// Answer one bridge call.
    ///
    /// This never errors: unknown methods reply `notImplemented`, and probe
    /// failures reply the 0.0 sentinel.
    pub async fn dispatch(&self, request: BridgeRequest) -> BridgeReply {
        debug!(request_id = %request.request_id, call = ?request.call, "dispatching bridge call");
        let BridgeRequest { request_id, call } = request;

        let reply = match call {
            MethodCall::GetCurrentNetworkType => MethodReply::NetworkType {
                value: self.current_network_type().await,
            },
            MethodCall::GetDownloadSpeed => MethodReply::Mbps {
                value: self.link_download_mbps().await,
            },
            MethodCall::GetUploadSpeed => MethodReply::Mbps {
                value: self.link_upload_mbps().await,
            },
            MethodCall::GetCurrentNetworkSpeed => MethodReply::Snapshot {
                value: self.network_snapshot().await,
            },
            MethodCall::RunDownloadSpeedTest { test_file_url } => MethodReply::Mbps {
                value: self
                    .run_download_test(test_file_url.as_deref())
                    .await
                    .mbps(),
            },
            MethodCall::RunUploadSpeedTest { test_file_url } => MethodReply::Mbps {
                value: self.run_upload_test(test_file_url.as_deref()).await.mbps(),
            },
            MethodCall::Unknown => {
                warn!(%request_id, "bridge call for unimplemented method");
                MethodReply::NotImplemented
            }
        };

        BridgeReply { request_id, reply }
    }
}

fn log_outcome(direction: Direction, outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Measured(t) => {
            info!(
                %direction,
                mbps = t.mbps,
                bytes = t.bytes,
                elapsed_ms = t.elapsed.as_millis() as u64,
                "speed test complete"
            );
        }
        ProbeOutcome::Failed(e) => {
            warn!(%direction, error = %e, "speed test failed, reporting 0.0");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
