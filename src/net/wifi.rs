//! Wi-Fi link reads via `iw`, plus the RSSI-to-level mapping.

use std::process::{Command, Output};

use tracing::debug;

/// RSSI clamp points for the level mapping, in dBm.
const MIN_RSSI_DBM: i32 = -100;
const MAX_RSSI_DBM: i32 = -55;
/// Number of signal buckets; levels run 0 to `SIGNAL_LEVELS - 1`.
const SIGNAL_LEVELS: i32 = 5;

/// What `iw dev <if> link` reports for an associated station.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WifiLink {
    pub connected: bool,
    pub signal_dbm: Option<i32>,
    pub rx_bitrate_mbps: Option<f64>,
    pub tx_bitrate_mbps: Option<f64>,
}

/// Read the link state of a wireless interface. Any execution failure reads
/// as a disconnected link.
pub(crate) fn read_link(iface: &str) -> WifiLink {
    let output = match iw_output(&["dev", iface, "link"]) {
        Some(output) if output.status.success() => output,
        _ => {
            debug!(%iface, "iw link query failed");
            return WifiLink::default();
        }
    };
    parse_link_output(&String::from_utf8_lossy(&output.stdout))
}

/// Run `iw` with the given arguments. iw usually lives in `/usr/sbin`, which
/// not every PATH carries, so try the absolute path first.
fn iw_output(args: &[&str]) -> Option<Output> {
    for bin in ["/usr/sbin/iw", "iw"] {
        if let Ok(output) = Command::new(bin).args(args).output() {
            return Some(output);
        }
    }
    None
}

/// Parse `iw dev <if> link` output.
///
/// Connected output looks like:
///
/// ```text
/// Connected to 00:11:22:33:44:55 (on wlan0)
///     SSID: MyNet
///     freq: 5180
///     signal: -50 dBm
///     rx bitrate: 433.3 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 1
///     tx bitrate: 866.7 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 2
/// ```
pub(crate) fn parse_link_output(stdout: &str) -> WifiLink {
    let mut link = WifiLink::default();

    if stdout.trim().is_empty() || stdout.contains("Not connected.") {
        return link;
    }
    link.connected = true;

    for line in stdout.lines() {
        let line = line.trim();
        if let Some(signal) = line.strip_prefix("signal: ") {
            // "-50 dBm"
            let val = signal.replace(" dBm", "");
            if let Ok(dbm) = val.trim().parse::<i32>() {
                link.signal_dbm = Some(dbm);
            }
        } else if let Some(rx) = line.strip_prefix("rx bitrate: ") {
            link.rx_bitrate_mbps = parse_bitrate(rx);
        } else if let Some(tx) = line.strip_prefix("tx bitrate: ") {
            link.tx_bitrate_mbps = parse_bitrate(tx);
        }
    }

    link
}

/// First token of a bitrate line: "866.7 MBit/s VHT-MCS 9 ..." -> 866.7.
fn parse_bitrate(rest: &str) -> Option<f64> {
    rest.split_whitespace().next()?.parse::<f64>().ok()
}

/// Map an RSSI reading to a 0-4 signal level.
///
/// Clamped linear mapping: anything at or below -100 dBm is level 0,
/// anything at or above -55 dBm is level 4.
pub(crate) fn signal_level(dbm: i32) -> i32 {
    if dbm <= MIN_RSSI_DBM {
        return 0;
    }
    if dbm >= MAX_RSSI_DBM {
        return SIGNAL_LEVELS - 1;
    }
    let input_range = (MAX_RSSI_DBM - MIN_RSSI_DBM) as f64;
    let output_range = (SIGNAL_LEVELS - 1) as f64;
    ((dbm - MIN_RSSI_DBM) as f64 * output_range / input_range) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONNECTED_OUTPUT: &str = "\
Connected to 00:11:22:33:44:55 (on wlan0)
\tSSID: MyNet
\tfreq: 5180
\tRX: 123456789 bytes (98765 packets)
\tTX: 12345678 bytes (45678 packets)
\tsignal: -50 dBm
\trx bitrate: 433.3 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 1
\ttx bitrate: 866.7 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 2
";

    #[test]
    fn test_parse_connected_link() {
        let link = parse_link_output(CONNECTED_OUTPUT);
        assert!(link.connected);
        assert_eq!(link.signal_dbm, Some(-50));
        assert_eq!(link.rx_bitrate_mbps, Some(433.3));
        assert_eq!(link.tx_bitrate_mbps, Some(866.7));
    }

    #[test]
    fn test_parse_not_connected() {
        let link = parse_link_output("Not connected.\n");
        assert!(!link.connected);
        assert_eq!(link.signal_dbm, None);
        assert_eq!(link.rx_bitrate_mbps, None);
    }

    #[test]
    fn test_parse_empty_output() {
        let link = parse_link_output("");
        assert!(!link.connected);
    }

    #[test]
    fn test_parse_partial_output_keeps_missing_fields_none() {
        let output = "\
Connected to aa:bb:cc:dd:ee:ff (on wlan1)
\tSSID: Cafe
\tsignal: -71 dBm
";
        let link = parse_link_output(output);
        assert!(link.connected);
        assert_eq!(link.signal_dbm, Some(-71));
        assert_eq!(link.rx_bitrate_mbps, None);
        assert_eq!(link.tx_bitrate_mbps, None);
    }

    #[test]
    fn test_parse_garbled_bitrate_is_none() {
        assert_eq!(parse_bitrate("MBit/s nonsense"), None);
        assert_eq!(parse_bitrate(""), None);
        assert_eq!(parse_bitrate("144.4 MBit/s"), Some(144.4));
    }

    #[test]
    fn test_signal_level_clamps() {
        assert_eq!(signal_level(-100), 0);
        assert_eq!(signal_level(-120), 0);
        assert_eq!(signal_level(-55), 4);
        assert_eq!(signal_level(-30), 4);
    }

    #[test]
    fn test_signal_level_interior_points() {
        // Linear over the -100..-55 range, truncated to the bucket below.
        assert_eq!(signal_level(-99), 0);
        assert_eq!(signal_level(-89), 0);
        assert_eq!(signal_level(-88), 1);
        assert_eq!(signal_level(-78), 1);
        assert_eq!(signal_level(-77), 2);
        assert_eq!(signal_level(-67), 2);
        assert_eq!(signal_level(-66), 3);
        assert_eq!(signal_level(-56), 3);
    }

    #[test]
    fn test_signal_level_is_monotonic() {
        let mut prev = signal_level(-120);
        for dbm in -119..=-30 {
            let level = signal_level(dbm);
            assert!(level >= prev, "level dropped at {} dBm", dbm);
            assert!((0..=4).contains(&level));
            prev = level;
        }
    }
}
