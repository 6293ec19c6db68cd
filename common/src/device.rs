//! Per-host outcomes and the aggregated scan result.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use thiserror::Error;

/// Ordered attribute map reported by an accessory (`MAC`, `Batt`, `PoeV`, ...).
///
/// Keys keep the position of their first occurrence. Inserting an existing
/// key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key: String = key.into();
        let value: String = value.into();

        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.pairs.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

/// A validated accessory. Identity is the address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub address: Ipv4Addr,
    pub attributes: Attributes,
}

impl Device {
    pub fn new(address: Ipv4Addr, attributes: Attributes) -> Self {
        Self { address, attributes }
    }

    /// The accessory's reported hardware address, if any.
    pub fn mac(&self) -> Option<&str> {
        self.attributes.get("MAC")
    }
}

/// Why the query phase failed on a host that accepted the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryFailure {
    /// Reconnecting or writing the payload failed.
    #[error("failed to send query")]
    Send,
    /// Nothing arrived before the query deadline.
    #[error("query timed out")]
    TimedOut,
    /// The peer reset the connection while the reply was being read.
    #[error("connection closed by peer")]
    ConnectionClosed,
}

/// Why a reply could not be turned into attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedResponse {
    #[error("empty response")]
    Empty,
    #[error("response is not valid UTF-8")]
    NotUtf8,
    #[error("response contains no key=value pairs")]
    NoPairs,
}

/// Terminal state of one host. Produced exactly once per host per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The host actively refused the port.
    Unreachable,
    /// Nothing answered the connect attempt before the deadline.
    TimedOut,
    QueryFailed(QueryFailure),
    ParseFailed(MalformedResponse),
    Discovered(Device),
}

impl ProbeOutcome {
    /// The host accepted the probe connection, whatever happened next.
    pub fn is_responsive(&self) -> bool {
        matches!(
            self,
            Self::QueryFailed(_) | Self::ParseFailed(_) | Self::Discovered(_)
        )
    }

    pub fn device(&self) -> Option<&Device> {
        match self {
            Self::Discovered(device) => Some(device),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "unreachable"),
            Self::TimedOut => write!(f, "timed out"),
            Self::QueryFailed(reason) => write!(f, "query failed: {reason}"),
            Self::ParseFailed(reason) => write!(f, "parse failed: {reason}"),
            Self::Discovered(device) => {
                write!(f, "discovered ({} attributes)", device.attributes.len())
            }
        }
    }
}

/// Counters for a finished run. `discovered <= responsive <= scanned`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Hosts that reached a terminal state.
    pub scanned: usize,
    /// Hosts that accepted the probe connection.
    pub responsive: usize,
    /// Hosts that answered with a valid reply.
    pub discovered: usize,
}

impl ScanSummary {
    /// Responsive hosts whose query or reply was unusable.
    pub fn invalid(&self) -> usize {
        self.responsive - self.discovered
    }
}

/// Final, caller-owned product of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Discovered accessories in enumeration order.
    pub devices: Vec<Device>,
    pub summary: ScanSummary,
    pub elapsed: Duration,
    /// The run was cancelled before every host reached a terminal state.
    pub interrupted: bool,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
