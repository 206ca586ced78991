//! Download measurement: a timed GET that drains the body through a byte
//! counter.

use std::time::Instant;

use futures::StreamExt;
use reqwest::header::USER_AGENT;
use tracing::{debug, warn};

use super::{
    build_client, throughput_mbps, ProbeError, ProbeOutcome, ProbeRequest, Throughput,
    PROBE_USER_AGENT,
};

/// Run one download measurement.
///
/// A failed transfer gets exactly one retry against `fallback_url`, unless
/// the target already is the fallback. The retry is a full fresh
/// measurement; the reported throughput is whatever the fallback transfer
/// achieved.
pub(crate) async fn run(request: &ProbeRequest, fallback_url: &str) -> ProbeOutcome {
    match fetch(request, &request.target_url).await {
        Ok(throughput) => ProbeOutcome::Measured(throughput),
        Err(err) if request.target_url != fallback_url => {
            warn!(
                url = %request.target_url,
                error = %err,
                fallback = %fallback_url,
                "download probe failed, retrying against fallback"
            );
            match fetch(request, fallback_url).await {
                Ok(throughput) => ProbeOutcome::Measured(throughput),
                Err(fallback_err) => {
                    warn!(
                        fallback = %fallback_url,
                        error = %fallback_err,
                        "fallback download probe failed"
                    );
                    ProbeOutcome::Failed(fallback_err)
                }
            }
        }
        Err(err) => {
            warn!(
                url = %request.target_url,
                error = %err,
                "download probe against the fallback target failed"
            );
            ProbeOutcome::Failed(err)
        }
    }
}

/// One timed GET against `url`.
///
/// The clock starts immediately before the request goes out and stops when
/// the body stream ends. The status line is not checked: a 404 whose body
/// streams to completion still measures real transfer throughput.
async fn fetch(request: &ProbeRequest, url: &str) -> Result<Throughput, ProbeError> {
    let client = build_client(request).map_err(|e| ProbeError::from_reqwest(url, e))?;

    let start = Instant::now();
    let response = client
        .get(url)
        .header(USER_AGENT, PROBE_USER_AGENT)
        .send()
        .await
        .map_err(|e| ProbeError::from_reqwest(url, e))?;

    let mut stream = response.bytes_stream();
    let mut received: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ProbeError::from_reqwest(url, e))?;
        received += chunk.len() as u64;
    }
    let elapsed = start.elapsed();

    let throughput = Throughput {
        mbps: throughput_mbps(received, elapsed),
        bytes: received,
        elapsed,
    };
    debug!(
        %url,
        bytes = received,
        elapsed_ms = elapsed.as_millis() as u64,
        mbps = throughput.mbps,
        "download probe complete"
    );
    Ok(throughput)
}
