//! Linux-backed link reads: default route discovery, sysfs, and `iw`.

use std::path::Path;
use std::process::Command;

use async_trait::async_trait;

use super::{wifi, LinkProbe, NetworkSnapshot, NetworkType};

/// Interface name prefixes used by cellular modems: WWAN devices, systemd
/// predictable `wwp*` names, and point-to-point dial-ups.
const MOBILE_PREFIXES: &[&str] = &["wwan", "wwp", "ppp"];

/// OS-backed [`LinkProbe`] reading the Linux networking stack.
///
/// Reads run on `spawn_blocking` workers: `ip` and `iw` are subprocesses and
/// sysfs reads touch the filesystem. Every failure along the way degrades to
/// the canonical unknowns instead of erroring.
#[derive(Debug, Clone, Default)]
pub struct SysLinkProbe {
    /// Pin reads to this interface instead of discovering the default route.
    interface: Option<String>,
}

impl SysLinkProbe {
    pub fn new(interface: Option<String>) -> Self {
        Self { interface }
    }

    fn active_interface(&self) -> Option<String> {
        if let Some(iface) = &self.interface {
            return Some(iface.clone());
        }
        default_route_interface()
    }

    fn read_network_type(&self) -> NetworkType {
        match self.active_interface() {
            Some(iface) => classify_interface(&iface, is_wireless(&iface)),
            None => NetworkType::Unknown,
        }
    }

    /// Negotiated (downstream, upstream) link rates in Mbps.
    fn read_capability(&self) -> (f64, f64) {
        let Some(iface) = self.active_interface() else {
            return (0.0, 0.0);
        };
        if is_wireless(&iface) {
            let link = wifi::read_link(&iface);
            // Some drivers only expose the tx rate; reuse it downstream
            // rather than reporting nothing.
            let down = link.rx_bitrate_mbps.or(link.tx_bitrate_mbps).unwrap_or(0.0);
            let up = link.tx_bitrate_mbps.unwrap_or(0.0);
            (down, up)
        } else {
            // Wired links negotiate a symmetric rate, exposed via sysfs.
            let speed = sysfs_speed_mbps(&iface).unwrap_or(0.0);
            (speed, speed)
        }
    }

    fn read_signal_level(&self) -> i32 {
        let Some(iface) = self.active_interface() else {
            return -1;
        };
        if !is_wireless(&iface) {
            return -1;
        }
        match wifi::read_link(&iface).signal_dbm {
            Some(dbm) => wifi::signal_level(dbm),
            None => -1,
        }
    }

    /// One blocking pass filling the whole snapshot, so the interface and
    /// the Wi-Fi link state are each read once.
    fn read_snapshot(&self) -> NetworkSnapshot {
        let Some(iface) = self.active_interface() else {
            return NetworkSnapshot::unknown();
        };
        let wireless = is_wireless(&iface);
        let network_type = classify_interface(&iface, wireless);

        let (download_mbps, upload_mbps, signal_strength) = if wireless {
            let link = wifi::read_link(&iface);
            let down = link.rx_bitrate_mbps.or(link.tx_bitrate_mbps).unwrap_or(0.0);
            let up = link.tx_bitrate_mbps.unwrap_or(0.0);
            let signal = match link.signal_dbm {
                Some(dbm) => wifi::signal_level(dbm),
                None => -1,
            };
            (down, up, signal)
        } else {
            let speed = sysfs_speed_mbps(&iface).unwrap_or(0.0);
            (speed, speed, -1)
        };

        NetworkSnapshot {
            network_type,
            download_mbps,
            upload_mbps,
            signal_strength,
        }
    }
}

#[async_trait]
impl LinkProbe for SysLinkProbe {
    async fn network_type(&self) -> NetworkType {
        let probe = self.clone();
        tokio::task::spawn_blocking(move || probe.read_network_type())
            .await
            .unwrap_or(NetworkType::Unknown)
    }

    async fn download_capability_mbps(&self) -> f64 {
        let probe = self.clone();
        tokio::task::spawn_blocking(move || probe.read_capability().0)
            .await
            .unwrap_or(0.0)
    }

    async fn upload_capability_mbps(&self) -> f64 {
        let probe = self.clone();
        tokio::task::spawn_blocking(move || probe.read_capability().1)
            .await
            .unwrap_or(0.0)
    }

    async fn signal_level(&self) -> i32 {
        let probe = self.clone();
        tokio::task::spawn_blocking(move || probe.read_signal_level())
            .await
            .unwrap_or(-1)
    }

    async fn snapshot(&self) -> NetworkSnapshot {
        let probe = self.clone();
        tokio::task::spawn_blocking(move || probe.read_snapshot())
            .await
            .unwrap_or_else(|_| NetworkSnapshot::unknown())
    }
}

// ---------------------------------------------------------------------------
// OS queries
// ---------------------------------------------------------------------------

/// Interface behind the default route, via `ip route show default`.
fn default_route_interface() -> Option<String> {
    let output = Command::new("ip")
        .args(["route", "show", "default"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_default_route(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the `dev <name>` token out of `ip route show default` output.
/// Format: "default via 192.168.1.1 dev eth0 proto dhcp metric 100".
/// Multiple default routes are listed by ascending metric; the first line is
/// the one in use.
pub(crate) fn parse_default_route(output: &str) -> Option<String> {
    let line = output.lines().next()?;
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "dev" {
            return tokens.next().map(|s| s.to_string());
        }
    }
    None
}

/// Classify an interface into the three-way transport bucket. Total: every
/// input lands in exactly one of wifi, mobile, or unknown. Wired ethernet
/// deliberately reads as unknown.
pub(crate) fn classify_interface(name: &str, wireless: bool) -> NetworkType {
    if wireless {
        return NetworkType::Wifi;
    }
    if MOBILE_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return NetworkType::Mobile;
    }
    NetworkType::Unknown
}

/// Whether the kernel exposes a wireless extension for the interface.
fn is_wireless(iface: &str) -> bool {
    Path::new("/sys/class/net").join(iface).join("wireless").exists()
}

/// Negotiated link rate from sysfs `speed`, in Mbps. Wireless and virtual
/// interfaces either omit the file or report -1; both read as None.
fn sysfs_speed_mbps(iface: &str) -> Option<f64> {
    let path = Path::new("/sys/class/net").join(iface).join("speed");
    let raw = std::fs::read_to_string(path).ok()?;
    let mbps: i64 = raw.trim().parse().ok()?;
    if mbps <= 0 {
        return None;
    }
    Some(mbps as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
