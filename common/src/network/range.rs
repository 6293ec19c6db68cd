//! IPv4 network ranges and host enumeration.
//!
//! A [`NetworkRange`] is parsed once from CIDR text and never changes. The
//! usable host set follows the usual convention: the network and broadcast
//! addresses are dropped when the prefix leaves room for hosts (`/0` through
//! `/30`), while `/31` point-to-point links and `/32` single hosts keep every
//! address.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;

use crate::error::RangeError;

/// Longest prefix that still reserves a network and a broadcast address.
const LAST_RESERVING_PREFIX: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkRange {
    network: Ipv4Network,
}

impl NetworkRange {
    /// Builds a range from an address and prefix length.
    ///
    /// Host bits in `addr` are accepted and ignored, so `192.168.1.77/24`
    /// describes the same range as `192.168.1.0/24`.
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, RangeError> {
        let network: Ipv4Network =
            Ipv4Network::new(addr, prefix).map_err(|_| RangeError::Prefix(prefix.to_string()))?;
        Ok(Self { network })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network.network()
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        self.network.broadcast()
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// First and last usable host, inclusive.
    fn bounds(&self) -> (u32, u32) {
        let start: u32 = self.network().into();
        let end: u32 = self.broadcast().into();

        if self.prefix() <= LAST_RESERVING_PREFIX {
            (start + 1, end - 1)
        } else {
            (start, end)
        }
    }

    /// Usable hosts in ascending numeric order.
    ///
    /// The iterator is lazy and can be cloned to restart the walk, which
    /// keeps a `/8` scan from materializing sixteen million addresses.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + Clone + Send + 'static {
        let (start, end) = self.bounds();
        (start..=end).map(Ipv4Addr::from)
    }

    /// Number of usable hosts. A `/0` holds more than `u32::MAX - 1`
    /// addresses, hence the wider type.
    pub fn host_count(&self) -> u64 {
        let (start, end) = self.bounds();
        u64::from(end - start) + 1
    }
}

/// Expands `range` into its ordered host addresses.
pub fn enumerate(range: &NetworkRange) -> impl Iterator<Item = Ipv4Addr> + Clone + Send + 'static {
    range.hosts()
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix())
    }
}

impl FromStr for NetworkRange {
    type Err = RangeError;

    /// Parses CIDR notation like "192.168.1.0/24". A bare address is read as
    /// a single-host `/32` range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s: &str = s.trim();
        if s.is_empty() {
            return Err(RangeError::Format { input: s.to_string() });
        }

        let (ip_str, prefix_str) = match s.split_once('/') {
            Some((ip, prefix)) => (ip, prefix),
            None => (s, "32"),
        };

        let addr: Ipv4Addr = ip_str
            .parse::<Ipv4Addr>()
            .map_err(|_| RangeError::Address(ip_str.to_string()))?;

        let prefix: u8 = prefix_str
            .parse::<u8>()
            .map_err(|_| RangeError::Prefix(prefix_str.to_string()))?;

        Self::new(addr, prefix)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn hosts_of(cidr: &str) -> Vec<Ipv4Addr> {
        cidr.parse::<NetworkRange>().unwrap().hosts().collect()
    }

    #[test]
    fn slash_24_drops_network_and_broadcast() {
        let hosts: Vec<Ipv4Addr> = hosts_of("192.168.1.0/24");
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(hosts[253], Ipv4Addr::new(192, 168, 1, 254));
    }

    #[test]
    fn slash_30_has_two_hosts() {
        assert_eq!(
            hosts_of("192.168.1.0/30"),
            vec![Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2)]
        );
    }

    #[test]
    fn slash_31_keeps_both_addresses() {
        assert_eq!(
            hosts_of("10.0.0.6/31"),
            vec![Ipv4Addr::new(10, 0, 0, 6), Ipv4Addr::new(10, 0, 0, 7)]
        );
    }

    #[test]
    fn slash_32_is_the_single_host() {
        assert_eq!(hosts_of("203.0.113.7/32"), vec![Ipv4Addr::new(203, 0, 113, 7)]);
        assert_eq!(hosts_of("203.0.113.7"), vec![Ipv4Addr::new(203, 0, 113, 7)]);
    }

    #[test]
    fn host_bits_are_ignored() {
        let range: NetworkRange = "172.16.5.10/20".parse().unwrap();
        assert_eq!(range.network(), Ipv4Addr::new(172, 16, 0, 0));
        assert_eq!(range.broadcast(), Ipv4Addr::new(172, 16, 15, 255));
        assert_eq!(range.to_string(), "172.16.0.0/20");
    }

    #[test]
    fn hosts_are_unique_ascending_and_inside_the_range() {
        for prefix in 20..=32u8 {
            let range = NetworkRange::new(Ipv4Addr::new(10, 1, 2, 3), prefix).unwrap();
            let hosts: Vec<Ipv4Addr> = enumerate(&range).collect();
            let unique: HashSet<Ipv4Addr> = hosts.iter().copied().collect();

            assert_eq!(unique.len(), hosts.len(), "duplicates for /{prefix}");
            assert_eq!(hosts.len() as u64, range.host_count(), "count for /{prefix}");
            assert!(hosts.windows(2).all(|w| w[0] < w[1]), "order for /{prefix}");

            if prefix <= 30 {
                assert!(!hosts.contains(&range.network()));
                assert!(!hosts.contains(&range.broadcast()));
            } else {
                assert!(hosts.contains(&range.network()));
                assert!(hosts.contains(&range.broadcast()));
            }
        }
    }

    #[test]
    fn enumeration_is_restartable() {
        let range: NetworkRange = "192.168.0.0/28".parse().unwrap();
        let walk = range.hosts();
        let first: Vec<Ipv4Addr> = walk.clone().collect();
        let second: Vec<Ipv4Addr> = walk.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn slash_0_counts_without_overflow() {
        let range = NetworkRange::new(Ipv4Addr::UNSPECIFIED, 0).unwrap();
        assert_eq!(range.host_count(), (1u64 << 32) - 2);
        assert_eq!(range.hosts().next(), Some(Ipv4Addr::new(0, 0, 0, 1)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!("".parse::<NetworkRange>(), Err(RangeError::Format { .. })));
        assert!(matches!(
            "999.1.2.3/24".parse::<NetworkRange>(),
            Err(RangeError::Address(_))
        ));
        assert!(matches!(
            "192.168.0.1/33".parse::<NetworkRange>(),
            Err(RangeError::Prefix(_))
        ));
        assert!(matches!(
            "192.168.0.1/abc".parse::<NetworkRange>(),
            Err(RangeError::Prefix(_))
        ));
        assert!(matches!("fe80::1/64".parse::<NetworkRange>(), Err(RangeError::Address(_))));
    }
}
