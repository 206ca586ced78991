//! Link-state reads: connection type, OS-reported capability, Wi-Fi signal.
//!
//! Everything in this module is a point-in-time pass-through of what the OS
//! already knows about the active link. Nothing here transfers traffic; the
//! numbers are negotiated link rates, not measurements, and can differ
//! wildly from what an actual transfer achieves.
//!
//! Failures never surface as errors. A link probe that cannot answer
//! degrades to the canonical unknowns: `NetworkType::Unknown`, 0.0 Mbps,
//! and signal level -1.

pub mod sys;
pub mod wifi;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Transport classification of the active network path.
///
/// Three buckets only. Wired ethernet, VPN tunnels, and everything else that
/// is neither Wi-Fi nor cellular lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Wifi,
    Mobile,
    Unknown,
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Wifi => write!(f, "wifi"),
            NetworkType::Mobile => write!(f, "mobile"),
            NetworkType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Point-in-time report of the active link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub network_type: NetworkType,
    /// OS-reported downstream capability in Mbps; 0.0 when unavailable.
    pub download_mbps: f64,
    /// OS-reported upstream capability in Mbps; 0.0 when unavailable.
    pub upload_mbps: f64,
    /// Wi-Fi signal level 0-4. Always -1 off Wi-Fi or when unknown.
    pub signal_strength: i32,
}

impl NetworkSnapshot {
    /// The all-unknown snapshot reported when the link cannot be read.
    pub fn unknown() -> Self {
        Self {
            network_type: NetworkType::Unknown,
            download_mbps: 0.0,
            upload_mbps: 0.0,
            signal_strength: -1,
        }
    }
}

/// Read-only view of the active link.
///
/// Implementations must degrade instead of failing: every method has a
/// defined answer even when the OS has nothing to say.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    /// Transport type of the interface behind the default route.
    async fn network_type(&self) -> NetworkType;

    /// OS-reported downstream link capability in Mbps; 0.0 when unavailable.
    async fn download_capability_mbps(&self) -> f64;

    /// OS-reported upstream link capability in Mbps; 0.0 when unavailable.
    async fn upload_capability_mbps(&self) -> f64;

    /// Wi-Fi signal level 0-4; -1 off Wi-Fi or when unavailable.
    async fn signal_level(&self) -> i32;

    /// Full report in one pass. Signal is only consulted on Wi-Fi; every
    /// other transport reports -1.
    async fn snapshot(&self) -> NetworkSnapshot {
        let network_type = self.network_type().await;
        let download_mbps = self.download_capability_mbps().await;
        let upload_mbps = self.upload_capability_mbps().await;
        let signal_strength = if network_type == NetworkType::Wifi {
            self.signal_level().await
        } else {
            -1
        };
        NetworkSnapshot {
            network_type,
            download_mbps,
            upload_mbps,
            signal_strength,
        }
    }
}
