//! Error taxonomy for a discovery run.
//!
//! Only construction-time failures and internal contract violations live
//! here. Per-host failures are never errors: they are recorded as a
//! [`ProbeOutcome`](crate::device::ProbeOutcome) and the run carries on.

use std::net::Ipv4Addr;

use thiserror::Error;

/// The network range could not be built from the caller's input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid network range '{input}': expected <ipv4>/<prefix>")]
    Format { input: String },

    #[error("invalid IPv4 address '{0}'")]
    Address(String),

    #[error("invalid prefix length '{0}': must be within 0..=32")]
    Prefix(String),
}

/// The scan configuration violates an engine invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("timeout {value:.3}s is outside the accepted range {min:.3}s..={max:.3}s")]
    TimeoutOutOfRange { value: f64, min: f64, max: f64 },

    #[error("query timeout must be greater than zero")]
    ZeroQueryTimeout,

    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    InvalidRange(#[from] RangeError),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// The same address reached a terminal state twice. The orchestrator
    /// dispatches every address exactly once, so this is a defect.
    #[error("internal aggregation error: {address} was recorded more than once")]
    InternalAggregation { address: Ipv4Addr },

    /// A host worker died or the dispatcher lost its permit pool.
    #[error("internal error: {0}")]
    Internal(String),
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
