//! Collects per-host outcomes from concurrent workers.
//!
//! Workers finish in whatever order the network dictates. The aggregator
//! keys outcomes by address, and addresses enumerate in ascending numeric
//! order, so a sorted map hands the devices back in enumeration order no
//! matter when each host completed.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tadisc_common::device::{Device, ProbeOutcome, ScanResult, ScanSummary};
use tadisc_common::error::DiscoveryError;
use tracing::error;

#[derive(Debug, Default)]
pub struct ResultAggregator {
    outcomes: Mutex<BTreeMap<Ipv4Addr, ProbeOutcome>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<Ipv4Addr, ProbeOutcome>> {
        // Nothing panics while the lock is held, so a poisoned map is still intact.
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the terminal outcome of `address`.
    ///
    /// A second record for the same address is refused with
    /// [`DiscoveryError::InternalAggregation`]; the first outcome is kept.
    pub fn record(&self, address: Ipv4Addr, outcome: ProbeOutcome) -> Result<(), DiscoveryError> {
        match self.lock().entry(address) {
            Entry::Vacant(slot) => {
                slot.insert(outcome);
                Ok(())
            }
            Entry::Occupied(existing) => {
                error!(
                    "{address} recorded twice (kept: {}, rejected: {outcome})",
                    existing.get()
                );
                Err(DiscoveryError::InternalAggregation { address })
            }
        }
    }

    /// Hosts recorded so far.
    pub fn recorded(&self) -> usize {
        self.lock().len()
    }

    /// Drains the recorded outcomes into the final result.
    pub fn finalize(&self, elapsed: Duration, interrupted: bool) -> ScanResult {
        let outcomes: BTreeMap<Ipv4Addr, ProbeOutcome> = std::mem::take(&mut *self.lock());

        let scanned: usize = outcomes.len();
        let responsive: usize = outcomes.values().filter(|o| o.is_responsive()).count();

        let devices: Vec<Device> = outcomes
            .into_values()
            .filter_map(|outcome| match outcome {
                ProbeOutcome::Discovered(device) => Some(device),
                _ => None,
            })
            .collect();

        ScanResult {
            summary: ScanSummary {
                scanned,
                responsive,
                discovered: devices.len(),
            },
            devices,
            elapsed,
            interrupted,
        }
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
