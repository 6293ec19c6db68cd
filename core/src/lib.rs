//! The accessory discovery engine.
//!
//! [`scanner::Scanner`] walks a [`NetworkRange`](tadisc_common::network::range::NetworkRange),
//! probes every host on the accessory port, queries the ones that answer and
//! hands back an ordered [`ScanResult`](tadisc_common::device::ScanResult).

pub mod aggregator;
pub mod network;
pub mod scanner;

pub use scanner::{CancelHandle, HostEvent, Scanner, discover};
