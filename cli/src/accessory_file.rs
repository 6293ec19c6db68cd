//! The accessory file consumed by the test application.
//!
//! One line per discovered accessory, `<IP>: key1=value1;key2=value2`, in
//! enumeration order.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use tadisc_common::device::Device;
use tadisc_protocols::format_record;
use tracing::{debug, error};

pub const DEFAULT_ACCESSORY_FILE: &str = "iperfaccessory";

/// Removes the previous run's file. Failures are logged, never fatal.
pub fn clear(path: &Path) {
    if !path.exists() {
        return;
    }

    match std::fs::remove_file(path) {
        Ok(()) => debug!("cleared accessory file {}", path.display()),
        Err(e) => error!("failed to remove {}: {e}", path.display()),
    }
}

/// Appends one record per device.
pub fn write(path: &Path, devices: &[Device]) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    for device in devices {
        writeln!(writer, "{}", format_record(device.address, &device.attributes))
            .with_context(|| format!("failed to write to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write to {}", path.display()))?;

    debug!("wrote {} entries to {}", devices.len(), path.display());
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
