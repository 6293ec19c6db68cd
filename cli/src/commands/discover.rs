use std::time::Duration;

use colored::*;
use tadisc_common::config::ScanConfig;
use tadisc_common::device::{Device, ScanResult};
use tadisc_common::network::range::NetworkRange;
use tadisc_core::{CancelHandle, HostEvent, Scanner};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::commands::CommandLine;
use crate::input::InputHandle;
use crate::terminal::{colors, format, print, spinner};
use crate::{accessory_file, mprint, options};

pub async fn discover(cmd: &CommandLine) -> anyhow::Result<()> {
    let file_timeout: Option<f64> = if cmd.options {
        options::load_timeout(&cmd.options_file)
    } else {
        None
    };
    let timeout: f64 = options::resolve_timeout(file_timeout, cmd.timeout);
    let cfg: ScanConfig = ScanConfig::new(timeout, cmd.verbose)?.with_concurrency(cmd.jobs)?;

    accessory_file::clear(&cmd.output);

    print::header("accessory discovery");
    print::print_status(format!(
        "Scanning {} on port {} (timeout {:.3}s)",
        cmd.network,
        cfg.port(),
        timeout
    ));

    let result: ScanResult = run_scan(&cmd.network, cfg, cmd.no_input).await?;

    if let Err(e) = accessory_file::write(&cmd.output, &result.devices) {
        error!("{e:#}");
    }

    log_summary(&result);
    discovery_ends(&result);
    Ok(())
}

async fn run_scan(range: &NetworkRange, cfg: ScanConfig, no_input: bool) -> anyhow::Result<ScanResult> {
    let cancel: CancelHandle = CancelHandle::new();

    let ctrl_c: JoinHandle<()> = {
        let cancel: CancelHandle = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, finishing early");
                cancel.cancel();
            }
        })
    };

    let input: Option<InputHandle> = if no_input {
        None
    } else {
        InputHandle::start(cancel.clone())
    };

    spinner::start_discovery_spinner(input.is_some());

    let (tx, rx) = mpsc::unbounded_channel::<HostEvent>();
    let progress: JoinHandle<()> = tokio::spawn(track_progress(rx, range.host_count()));

    let scanner: Scanner = Scanner::new(cfg).with_events(tx);
    let result = scanner.run(range, &cancel).await;

    drop(scanner);
    drop(input);
    ctrl_c.abort();
    let _ = progress.await;
    spinner::finish_discovery_spinner();

    Ok(result?)
}

async fn track_progress(mut rx: UnboundedReceiver<HostEvent>, total: u64) {
    let mut scanned: usize = 0;
    let mut found: usize = 0;

    while let Some(event) = rx.recv().await {
        scanned += 1;
        if event.outcome.device().is_some() {
            found += 1;
        }
        spinner::report_discovery_progress(scanned, total, found);
    }
}

fn log_summary(result: &ScanResult) {
    let summary = &result.summary;

    if result.interrupted {
        warn!("scan interrupted, results are partial");
    }
    info!("Total IPs scanned: {}", summary.scanned);
    info!("Total IPs with port 2359 open: {}", summary.responsive);
    info!("Total valid accessories: {}", summary.discovered);
    info!("Total invalid responses: {}", summary.invalid());
    info!("Scan completed in {:.2} seconds", result.elapsed.as_secs_f64());
}

fn discovery_ends(result: &ScanResult) {
    mprint!();

    if result.devices.is_empty() {
        print::header("zero accessories detected");
        print::no_results();
    } else {
        print::header("discovered accessories");
        print_devices(&result.devices);
    }

    print_summary(result);
    print::end_of_program();
}

fn print_devices(devices: &[Device]) {
    for (idx, device) in devices.iter().enumerate() {
        let name: &str = device.mac().unwrap_or("Accessory");
        print::tree_head(idx, name);
        print::as_tree_one_level(format::device_to_details(device));
        if idx + 1 != devices.len() {
            mprint!();
        }
    }
}

fn print_summary(result: &ScanResult) {
    let summary = &result.summary;
    let total_time: Duration = result.elapsed;

    let found: ColoredString = format!("{} accessories", summary.discovered).bold().green();
    let time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let verb: &str = if result.interrupted { "Stopped early" } else { "Discovery complete" };

    print::fat_separator();
    print::centerln(&format!(
        "{}",
        format!("{verb}: {found} identified in {time}").color(colors::TEXT_DEFAULT)
    ));
    print::centerln(&format!(
        "{} scanned, {} open, {} invalid",
        summary.scanned,
        summary.responsive,
        summary.invalid().to_string().red()
    ));
}
