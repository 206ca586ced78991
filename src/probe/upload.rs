//! Upload measurement: a timed POST of a fixed-size generated payload.

use std::time::Instant;

use bytes::Bytes;
use rand::RngCore;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use super::{build_client, throughput_mbps, ProbeError, ProbeOutcome, ProbeRequest, Throughput};

/// Run one upload measurement. There is no fallback: any failure is terminal.
///
/// The clock starts immediately before the payload goes out and stops once
/// the server's response arrives. The response body is never read and never
/// enters the computation; the byte count is always the payload size.
pub(crate) async fn run(request: &ProbeRequest) -> ProbeOutcome {
    let url = request.target_url.as_str();
    let payload = generate_payload(request.payload_bytes);
    let payload_len = payload.len() as u64;

    let client = match build_client(request) {
        Ok(client) => client,
        Err(e) => {
            let err = ProbeError::from_reqwest(url, e);
            warn!(%url, error = %err, "upload probe failed");
            return ProbeOutcome::Failed(err);
        }
    };

    let start = Instant::now();
    let result = client
        .post(url)
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(payload)
        .send()
        .await;
    let elapsed = start.elapsed();

    match result {
        Ok(_response) => {
            let throughput = Throughput {
                mbps: throughput_mbps(payload_len, elapsed),
                bytes: payload_len,
                elapsed,
            };
            debug!(
                %url,
                bytes = payload_len,
                elapsed_ms = elapsed.as_millis() as u64,
                mbps = throughput.mbps,
                "upload probe complete"
            );
            ProbeOutcome::Measured(throughput)
        }
        Err(e) => {
            let err = ProbeError::from_reqwest(url, e);
            warn!(%url, error = %err, "upload probe failed");
            ProbeOutcome::Failed(err)
        }
    }
}

/// Generate `len` bytes of random, incompressible payload. A fresh payload
/// is generated for every probe.
fn generate_payload(len: usize) -> Bytes {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    Bytes::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_has_exact_length() {
        assert_eq!(generate_payload(1_048_576).len(), 1_048_576);
        assert_eq!(generate_payload(0).len(), 0);
        assert_eq!(generate_payload(7).len(), 7);
    }

    #[test]
    fn test_payloads_differ_between_probes() {
        let a = generate_payload(64);
        let b = generate_payload(64);
        assert_ne!(a, b);
    }
}
