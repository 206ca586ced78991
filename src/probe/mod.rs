//! Active speed probing: timed HTTP transfers against a remote URL.
//!
//! A probe is one independent measurement. It opens its own connection,
//! moves bytes in a single direction, and reports the observed throughput as
//! `(bytes * 8 / 1_000_000) / elapsed_seconds`. Elapsed time is floored at
//! [`MIN_ELAPSED`] so a transfer that completes inside the clock resolution
//! still divides by something.
//!
//! Probes do not share connections, sessions, or results with each other.
//! Each call builds a fresh client from the configured timeouts, runs to
//! completion (or failure), and delivers exactly one [`ProbeOutcome`].

pub mod download;
pub mod upload;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::ProbeConfig;

/// Floor applied to a measured elapsed time before dividing, so that very
/// small transfers report a finite throughput instead of infinity.
pub const MIN_ELAPSED: Duration = Duration::from_millis(1);

/// User-Agent sent on download probes. Public sample-file hosts tend to
/// reject headerless clients.
pub(crate) const PROBE_USER_AGENT: &str = "Mozilla/5.0";

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Which way the measured bytes flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Download,
    Upload,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Download => write!(f, "download"),
            Direction::Upload => write!(f, "upload"),
        }
    }
}

/// One immutable measurement request. Built once per call; nothing in it is
/// shared with other probes.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub direction: Direction,
    pub target_url: String,
    /// Size of the generated payload for uploads. Ignored for downloads.
    pub payload_bytes: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

/// Measured detail behind a successful probe.
#[derive(Debug, Clone, Serialize)]
pub struct Throughput {
    /// Effective throughput in megabits per second.
    pub mbps: f64,
    /// Bytes counted in the measured direction.
    pub bytes: u64,
    /// Wall-clock duration of the transfer.
    pub elapsed: Duration,
}

/// Why a probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The transfer did not complete within the configured timeout.
    #[error("probe of {url} timed out")]
    TimedOut { url: String },

    /// Connection setup failed, the transfer broke mid-flight, or the URL
    /// could not be used at all.
    #[error("probe of {url} failed: {source}")]
    Transfer {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The worker task ended without delivering an outcome.
    #[error("probe task dropped before delivering an outcome")]
    Abandoned,
}

impl ProbeError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::TimedOut {
                url: url.to_string(),
            }
        } else {
            ProbeError::Transfer {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Outcome of one probe.
///
/// `Failed` keeps the underlying error for in-process callers. The bridge,
/// API, and CLI surfaces collapse it to the 0.0 sentinel via [`mbps`], which
/// makes a failed probe indistinguishable from a measured near-zero link on
/// those surfaces. Callers that need the distinction match on the variant.
///
/// [`mbps`]: ProbeOutcome::mbps
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The transfer completed and was timed.
    Measured(Throughput),
    /// The transfer failed (after the fallback retry, for downloads).
    Failed(ProbeError),
}

impl ProbeOutcome {
    /// The numeric-only view: measured Mbps, or exactly 0.0 on failure.
    pub fn mbps(&self) -> f64 {
        match self {
            ProbeOutcome::Measured(t) => t.mbps,
            ProbeOutcome::Failed(_) => 0.0,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, ProbeOutcome::Measured(_))
    }
}

/// Effective throughput for `bytes` moved in `elapsed`.
///
/// Megabits use the decimal definition (1 Mbps = 1_000_000 bits/s), and
/// `elapsed` is floored at [`MIN_ELAPSED`].
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.max(MIN_ELAPSED).as_secs_f64();
    (bytes as f64 * 8.0 / 1_000_000.0) / secs
}

pub(crate) fn build_client(request: &ProbeRequest) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(request.connect_timeout)
        .timeout(request.request_timeout)
        .build()
}

async fn run(request: &ProbeRequest, fallback_url: &str) -> ProbeOutcome {
    match request.direction {
        Direction::Download => download::run(request, fallback_url).await,
        Direction::Upload => upload::run(request).await,
    }
}

// ---------------------------------------------------------------------------
// Prober
// ---------------------------------------------------------------------------

/// Runs active speed probes using the configured targets and timeouts.
///
/// The prober itself holds only configuration. All measurement state lives
/// in the individual [`ProbeRequest`], so concurrent probes never interact.
pub struct Prober {
    config: ProbeConfig,
}

impl Prober {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Build the immutable request for one measurement. `target_url` of
    /// `None` selects the configured default for the direction.
    pub fn request(&self, direction: Direction, target_url: Option<&str>) -> ProbeRequest {
        let target_url = match (direction, target_url) {
            (_, Some(url)) => url.to_string(),
            (Direction::Download, None) => self.config.download_url.clone(),
            (Direction::Upload, None) => self.config.upload_url.clone(),
        };
        ProbeRequest {
            direction,
            target_url,
            payload_bytes: self.config.upload_payload_bytes,
            connect_timeout: self.config.connect_timeout(),
            request_timeout: self.config.request_timeout(),
        }
    }

    /// Run one measurement to completion on the current task.
    pub async fn measure(&self, request: ProbeRequest) -> ProbeOutcome {
        run(&request, &self.config.fallback_url).await
    }

    /// Run one measurement on a detached worker task.
    ///
    /// The returned ticket resolves exactly once with the outcome. There is
    /// no cancellation: a started transfer runs until it completes, times
    /// out, or fails.
    pub fn spawn(&self, request: ProbeRequest) -> ProbeTicket {
        let (tx, rx) = oneshot::channel();
        let fallback_url = self.config.fallback_url.clone();
        let probe_id = Uuid::new_v4();
        tokio::spawn(async move {
            let outcome = run(&request, &fallback_url).await;
            // Nobody left to tell is fine; the probe still ran to completion.
            let _ = tx.send(outcome);
        });
        ProbeTicket { probe_id, rx }
    }
}

/// Handle to a measurement running on a worker task.
pub struct ProbeTicket {
    probe_id: Uuid,
    rx: oneshot::Receiver<ProbeOutcome>,
}

impl ProbeTicket {
    pub fn probe_id(&self) -> Uuid {
        self.probe_id
    }

    /// Wait for the single outcome. A worker that vanished without reporting
    /// reads as a failed probe.
    pub async fn outcome(self) -> ProbeOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Failed(ProbeError::Abandoned),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
