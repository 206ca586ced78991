//! Method-call bridge types.
//!
//! The call surface mirrors a UI-layer method channel: a method name plus
//! optional arguments in, a single flat value out. Every call is wrapped in
//! a [`BridgeRequest`] envelope carrying a `request_id` for correlation, and
//! the call itself is internally-tagged JSON (`"method": "..."`) so a
//! transport can dispatch on the `method` field without parsing the rest.
//!
//! A method name nothing matches deserializes to [`MethodCall::Unknown`] and
//! resolves to a `notImplemented` reply. It is not a transport error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::net::{NetworkSnapshot, NetworkType};

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Envelope for one inbound method call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Correlates the reply with the call. Generated when the caller omits it.
    #[serde(default = "new_request_id")]
    pub request_id: String,
    /// The call itself.
    pub call: MethodCall,
}

impl BridgeRequest {
    pub fn new(call: MethodCall) -> Self {
        Self {
            request_id: new_request_id(),
            call,
        }
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Envelope for the reply to one method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    /// Echoes the `request_id` of the call being answered.
    pub request_id: String,
    /// The single result value.
    pub reply: MethodReply,
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// The method-call surface.
///
/// Serialized as internally-tagged JSON: `{ "method": "<name>", ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum MethodCall {
    /// Transport type of the active connection.
    GetCurrentNetworkType,
    /// OS-reported downstream link capability. Not a measurement.
    GetDownloadSpeed,
    /// OS-reported upstream link capability. Not a measurement.
    GetUploadSpeed,
    /// Full point-in-time link snapshot.
    GetCurrentNetworkSpeed,
    /// Active, timed download against `testFileUrl`, or the configured
    /// default target when absent.
    RunDownloadSpeedTest {
        #[serde(
            rename = "testFileUrl",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        test_file_url: Option<String>,
    },
    /// Active, timed upload against `testFileUrl`, or the configured default
    /// target when absent.
    RunUploadSpeedTest {
        #[serde(
            rename = "testFileUrl",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        test_file_url: Option<String>,
    },
    /// Catch-all for method names this surface does not implement.
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// The single flat value answering a method call.
///
/// Serialized as internally-tagged JSON: `{ "kind": "<shape>", ... }`.
/// Probe failures never produce an error shape; they arrive as an `mbps`
/// reply carrying the 0.0 sentinel, indistinguishable on this surface from
/// a measured near-zero link. [`crate::probe::ProbeOutcome`] keeps the
/// distinction for in-process callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MethodReply {
    /// Answer to `getCurrentNetworkType`.
    NetworkType { value: NetworkType },
    /// Answer to the capability getters and both speed tests.
    Mbps { value: f64 },
    /// Answer to `getCurrentNetworkSpeed`.
    Snapshot { value: NetworkSnapshot },
    /// Answer to any unrecognized method.
    NotImplemented,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
