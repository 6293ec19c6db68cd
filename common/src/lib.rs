//! Shared data model for accessory discovery.
//!
//! Everything that crosses a crate boundary lives here: the scan input
//! ([`network::range::NetworkRange`], [`config::ScanConfig`]), the per-host
//! outcome and the final [`device::ScanResult`].

pub mod config;
pub mod device;
pub mod error;
pub mod network;
