// Best-effort host network details used to decorate responses

use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4, UdpSocket};
use tracing::debug;

pub const UNAVAILABLE: &str = "unavailable";

/// Address of the host serving the request. Informational only.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HostInfo {
    pub ip: String,
    pub mac: String,
}

impl HostInfo {
    /// Detect the host's IPv4 and MAC address, falling back to placeholders
    pub fn detect() -> Self {
        Self {
            ip: local_ipv4()
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| UNAVAILABLE.to_string()),
            mac: local_mac().unwrap_or_else(|| UNAVAILABLE.to_string()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            ip: UNAVAILABLE.to_string(),
            mac: UNAVAILABLE.to_string(),
        }
    }
}

/// Source address the OS would use for outbound traffic.
/// Connecting a UDP socket only selects a route; nothing is sent.
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    if let Err(e) = socket.connect(SocketAddrV4::new(Ipv4Addr::new(192, 0, 2, 1), 9)) {
        debug!("No IPv4 route available: {}", e);
        return None;
    }

    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

/// Hardware address of the first non-loopback interface
#[cfg(target_os = "linux")]
pub fn local_mac() -> Option<String> {
    let mut interfaces: Vec<_> = std::fs::read_dir("/sys/class/net")
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    interfaces.sort();

    interfaces.into_iter().find_map(|path| {
        if path.file_name().is_some_and(|name| name == "lo") {
            return None;
        }
        let address = std::fs::read_to_string(path.join("address")).ok()?;
        parse_mac(&address)
    })
}

#[cfg(not(target_os = "linux"))]
pub fn local_mac() -> Option<String> {
    None
}

/// Normalize a sysfs MAC string; all-zero addresses are rejected
fn parse_mac(raw: &str) -> Option<String> {
    let mac = raw.trim().to_ascii_uppercase();
    let octets: Vec<&str> = mac.split(':').collect();

    let well_formed = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
    if !well_formed || octets.iter().all(|o| *o == "00") {
        return None;
    }

    Some(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac() {
        assert_eq!(
            parse_mac("02:42:ac:11:00:02\n"),
            Some("02:42:AC:11:00:02".to_string())
        );
        assert_eq!(parse_mac("00:00:00:00:00:00"), None);
        assert_eq!(parse_mac("not-a-mac"), None);
        assert_eq!(parse_mac(""), None);
    }

    #[test]
    fn test_detect_never_fails() {
        let info = HostInfo::detect();
        assert!(!info.ip.is_empty());
        assert!(!info.mac.is_empty());
        if info.ip != UNAVAILABLE {
            assert!(info.ip.parse::<Ipv4Addr>().is_ok());
        }
    }

    #[test]
    fn test_unavailable_placeholders() {
        let info = HostInfo::unavailable();
        assert_eq!(info.ip, "unavailable");
        assert_eq!(info.mac, "unavailable");
    }
}
