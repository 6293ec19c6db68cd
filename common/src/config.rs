//! Scan configuration and the fixed accessory constants.

use std::time::Duration;

use crate::error::ConfigError;

/// TCP port the accessory firmware listens on.
pub const ACCESSORY_PORT: u16 = 2359;

/// Query understood by the accessory firmware.
pub const QUERY_PAYLOAD: &[u8] = b"TA:getattrlong";

/// Upper bound on the bytes read from one accessory reply.
pub const RESPONSE_BUFFER_SIZE: usize = 4096;

pub const MIN_SCAN_TIMEOUT: f64 = 0.010;
pub const MAX_SCAN_TIMEOUT: f64 = 0.160;
pub const DEFAULT_SCAN_TIMEOUT: f64 = MIN_SCAN_TIMEOUT;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Hosts processed at once. Caps open sockets on large ranges.
pub const DEFAULT_CONCURRENCY: usize = 256;

/// Returns `true` when `seconds` is an acceptable connect timeout.
pub fn is_valid_timeout(seconds: f64) -> bool {
    seconds.is_finite() && (MIN_SCAN_TIMEOUT..=MAX_SCAN_TIMEOUT).contains(&seconds)
}

/// Immutable settings for one discovery run.
///
/// Built once by the caller and handed to the scanner by value. Validation
/// happens in the constructors; the engine trusts a `ScanConfig` it receives.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    timeout: Duration,
    query_timeout: Duration,
    port: u16,
    payload: &'static [u8],
    concurrency: usize,
    /// Mirrors the caller's `--verbose` flag. The engine only uses it to
    /// decide how chatty its per-host tracing is.
    pub verbose: bool,
}

impl ScanConfig {
    /// Creates a configuration with the given connect timeout in seconds.
    ///
    /// The value must already lie within
    /// [`MIN_SCAN_TIMEOUT`]..=[`MAX_SCAN_TIMEOUT`]; anything else is rejected
    /// rather than clamped, since clamping is the caller's policy.
    pub fn new(timeout_secs: f64, verbose: bool) -> Result<Self, ConfigError> {
        if !is_valid_timeout(timeout_secs) {
            return Err(ConfigError::TimeoutOutOfRange {
                value: timeout_secs,
                min: MIN_SCAN_TIMEOUT,
                max: MAX_SCAN_TIMEOUT,
            });
        }

        Ok(Self {
            timeout: Duration::from_secs_f64(timeout_secs),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            port: ACCESSORY_PORT,
            payload: QUERY_PAYLOAD,
            concurrency: DEFAULT_CONCURRENCY,
            verbose,
        })
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Result<Self, ConfigError> {
        if query_timeout.is_zero() {
            return Err(ConfigError::ZeroQueryTimeout);
        }
        self.query_timeout = query_timeout;
        Ok(self)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    /// Points the scan at a port other than [`ACCESSORY_PORT`].
    ///
    /// Accessories always listen on 2359; this exists for loopback test
    /// harnesses that cannot bind the real port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Connect-phase timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query-phase timeout, covering reconnect, send and read.
    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn payload(&self) -> &'static [u8] {
        self.payload
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_SCAN_TIMEOUT),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            port: ACCESSORY_PORT,
            payload: QUERY_PAYLOAD,
            concurrency: DEFAULT_CONCURRENCY,
            verbose: false,
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
