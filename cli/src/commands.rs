pub mod discover;

use std::path::PathBuf;

use clap::Parser;
use tadisc_common::config::DEFAULT_CONCURRENCY;
use tadisc_common::network::range::NetworkRange;

use crate::{accessory_file, options};

#[derive(Parser, Debug)]
#[command(name = "tadisc", version)]
#[command(about = "Discover test accessories listening on TCP port 2359.")]
pub struct CommandLine {
    /// IPv4 network to scan (e.g. 192.168.1.0/24)
    pub network: NetworkRange,

    /// Connect timeout in seconds, between 0.010 and 0.160
    #[arg(short, long)]
    pub timeout: Option<f64>,

    /// Read the timeout from the options file
    #[arg(short, long)]
    pub options: bool,

    /// Options file consulted by --options
    #[arg(long, default_value = options::DEFAULT_OPTIONS_FILE)]
    pub options_file: PathBuf,

    /// Mirror the log on the console
    #[arg(long)]
    pub verbose: bool,

    /// Hosts probed at the same time
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub jobs: usize,

    /// Where discovered accessories are written
    #[arg(long, default_value = accessory_file::DEFAULT_ACCESSORY_FILE)]
    pub output: PathBuf,

    /// Log file, truncated on every run
    #[arg(long, default_value = "iperfdiscovery.log")]
    pub log_file: PathBuf,

    /// Do not listen for 'q' to stop the scan early
    #[arg(long)]
    pub no_input: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
