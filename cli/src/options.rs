//! Connect-timeout resolution.
//!
//! Precedence, lowest first: built-in default, the options file (only with
//! `--options`), the `--timeout` flag. A candidate outside the accepted range
//! is reported and skipped, so the scanner always gets a valid value.

use std::path::Path;

use serde::Deserialize;
use tadisc_common::config::{self, DEFAULT_SCAN_TIMEOUT, MAX_SCAN_TIMEOUT, MIN_SCAN_TIMEOUT};
use tracing::{debug, error, warn};

pub const DEFAULT_OPTIONS_FILE: &str = "/mnt/mmc3/iperfaccessory.conf";

/// Keys understood in the options file. Anything else is ignored.
#[derive(Debug, Default, Deserialize)]
struct OptionsFile {
    timeout: Option<f64>,
}

/// Reads the `timeout` key from the options file at `path`.
///
/// A missing, unreadable or malformed file is logged and yields `None`.
pub fn load_timeout(path: &Path) -> Option<f64> {
    let text: String = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            error!("failed to read {}: {e}", path.display());
            return None;
        }
    };

    let options: OptionsFile = match toml::from_str(&text) {
        Ok(options) => options,
        Err(e) => {
            error!("invalid options file {}: {e}", path.display());
            return None;
        }
    };

    match options.timeout {
        Some(timeout) => {
            debug!("parsed timeout from {}: {timeout:.3}s", path.display());
            Some(timeout)
        }
        None => {
            debug!("no timeout in {}", path.display());
            None
        }
    }
}

pub fn resolve_timeout(file_timeout: Option<f64>, flag_timeout: Option<f64>) -> f64 {
    let mut timeout: f64 = DEFAULT_SCAN_TIMEOUT;

    for (source, candidate) in [("options file", file_timeout), ("--timeout", flag_timeout)] {
        let Some(candidate) = candidate else {
            continue;
        };

        if config::is_valid_timeout(candidate) {
            timeout = candidate;
        } else {
            warn!(
                "{source} timeout {candidate:.3}s out of range ({MIN_SCAN_TIMEOUT:.3}-{MAX_SCAN_TIMEOUT:.3}), using {timeout:.3}s"
            );
        }
    }

    timeout
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
