//! The scan **orchestrator**.
//!
//! Every enumerated address walks the same short state machine:
//!
//! ```text
//! Pending ─▶ Probing ─┬─▶ Unreachable | TimedOut
//!                     └─▶ Querying ─┬─▶ QueryFailed
//!                                   └─▶ Parsing ─▶ ParseFailed | Discovered
//! ```
//!
//! Hosts are dispatched in enumeration order, at most
//! [`ScanConfig::concurrency`] at a time. A host that cannot get a slot stays
//! `Pending` until one frees up. Each host is visited once; no outcome is
//! retried. Completed outcomes go to the [`ResultAggregator`] and, when a
//! listener is attached, out as a [`HostEvent`].
//!
//! **Cancellation:** once the [`CancelHandle`] fires, no further host is
//! dispatched and hosts still in flight are abandoned without being recorded.
//! The result then covers exactly the hosts that finished beforehand.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;

use tadisc_common::config::ScanConfig;
use tadisc_common::device::{Device, ProbeOutcome, ScanResult};
use tadisc_common::error::DiscoveryError;
use tadisc_common::network::range::{NetworkRange, enumerate};
use tadisc_protocols::accessory;
use tokio::sync::{Semaphore, mpsc::UnboundedSender, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::aggregator::ResultAggregator;
use crate::network::tcp::{self, ProbeStatus};
use crate::network::transport::{Connector, TcpConnector};

/// Diagnostic record emitted once per host that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEvent {
    pub address: Ipv4Addr,
    pub outcome: ProbeOutcome,
}

/// Stops a running scan. Clones share the same signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx: watch::Receiver<bool> = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Scanner<C: Connector = TcpConnector> {
    connector: Arc<C>,
    config: ScanConfig,
    events: Option<UnboundedSender<HostEvent>>,
}

impl Scanner<TcpConnector> {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> Scanner<C> {
    pub fn with_connector(config: ScanConfig, connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            config,
            events: None,
        }
    }

    /// Streams a [`HostEvent`] for every host that reaches a terminal state.
    pub fn with_events(mut self, events: UnboundedSender<HostEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Scans every usable host of `range`.
    ///
    /// Per-host failures never fail the run. Only internal contract
    /// violations do, and they abort the remaining workers.
    pub async fn run(&self, range: &NetworkRange, cancel: &CancelHandle) -> Result<ScanResult, DiscoveryError> {
        let started: Instant = Instant::now();
        let aggregator: Arc<ResultAggregator> = Arc::new(ResultAggregator::new());
        let slots: Arc<Semaphore> = Arc::new(Semaphore::new(self.config.concurrency()));
        let mut workers: JoinSet<Result<(), DiscoveryError>> = JoinSet::new();

        info!(
            "scanning {range} ({} hosts) on port {}, timeout {:.3}s",
            range.host_count(),
            self.config.port(),
            self.config.timeout().as_secs_f64()
        );

        for address in enumerate(range) {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&slots).acquire_owned() => permit
                    .map_err(|_| DiscoveryError::Internal("host slot pool closed".into()))?,
            };

            while let Some(joined) = workers.try_join_next() {
                settle(joined)?;
            }

            let job = HostJob {
                address,
                connector: Arc::clone(&self.connector),
                config: self.config.clone(),
                aggregator: Arc::clone(&aggregator),
                events: self.events.clone(),
                cancel: cancel.clone(),
            };

            workers.spawn(async move {
                let _permit = permit;
                job.run().await
            });
        }

        while let Some(joined) = workers.join_next().await {
            settle(joined)?;
        }

        let interrupted: bool = (aggregator.recorded() as u64) < range.host_count();
        if interrupted {
            warn!("scan of {range} interrupted");
        }

        let result: ScanResult = aggregator.finalize(started.elapsed(), interrupted);
        info!(
            "scan of {range} finished: {} scanned, {} with port {} open, {} accessories ({:.3}s)",
            result.summary.scanned,
            result.summary.responsive,
            self.config.port(),
            result.summary.discovered,
            result.elapsed.as_secs_f64()
        );

        Ok(result)
    }
}

/// Surfaces worker failures. A panicking worker is a defect, so it fails the
/// run the same way a double record does.
fn settle(joined: Result<Result<(), DiscoveryError>, JoinError>) -> Result<(), DiscoveryError> {
    match joined {
        Ok(recorded) => recorded,
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(DiscoveryError::Internal(format!("host worker failed: {e}"))),
    }
}

struct HostJob<C: Connector> {
    address: Ipv4Addr,
    connector: Arc<C>,
    config: ScanConfig,
    aggregator: Arc<ResultAggregator>,
    events: Option<UnboundedSender<HostEvent>>,
    cancel: CancelHandle,
}

impl<C: Connector> HostJob<C> {
    async fn run(self) -> Result<(), DiscoveryError> {
        let outcome: ProbeOutcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                trace!("{} abandoned by cancellation", self.address);
                return Ok(());
            }
            outcome = examine_host(self.connector.as_ref(), self.address, &self.config) => outcome,
        };

        match &outcome {
            ProbeOutcome::Discovered(device) => {
                info!("accessory at {} ({} attributes)", self.address, device.attributes.len())
            }
            other if self.config.verbose => debug!("{}: {other}", self.address),
            other => trace!("{}: {other}", self.address),
        }

        self.aggregator.record(self.address, outcome.clone())?;

        if let Some(events) = &self.events {
            // A listener that went away does not stop the scan.
            let _ = events.send(HostEvent {
                address: self.address,
                outcome,
            });
        }

        Ok(())
    }
}

/// Drives one host from `Probing` to its terminal state.
pub async fn examine_host<C: Connector>(connector: &C, address: Ipv4Addr, config: &ScanConfig) -> ProbeOutcome {
    let target: SocketAddrV4 = SocketAddrV4::new(address, config.port());

    match tcp::probe(connector, target, config.timeout()).await {
        ProbeStatus::Reachable => {}
        ProbeStatus::Unreachable => return ProbeOutcome::Unreachable,
        ProbeStatus::TimedOut => return ProbeOutcome::TimedOut,
    }

    let reply: Vec<u8> = match tcp::query(connector, target, config.payload(), config.query_timeout()).await {
        Ok(reply) => reply,
        Err(failure) => return ProbeOutcome::QueryFailed(failure),
    };

    match accessory::parse_response(&reply) {
        Ok(attributes) => ProbeOutcome::Discovered(Device::new(address, attributes)),
        Err(reason) => {
            debug!("{address} sent an unusable reply ({reason}): {:?}", String::from_utf8_lossy(&reply));
            ProbeOutcome::ParseFailed(reason)
        }
    }
}

/// Validates the caller's inputs and scans `range` over real TCP.
pub async fn discover(
    range: &NetworkRange,
    timeout_secs: f64,
    verbose: bool,
    cancel: &CancelHandle,
) -> Result<ScanResult, DiscoveryError> {
    let config: ScanConfig = ScanConfig::new(timeout_secs, verbose)?;
    Scanner::new(config).run(range, cancel).await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
