use std::io::Write;
use std::sync::OnceLock;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const TIP_DURATION: Duration = Duration::from_secs(1);
const MESSAGE_READ_TIME: Duration = Duration::from_secs(1);
const MIN_TIP_VISIBILITY: Duration = Duration::from_millis(750);
const TIPS: &[&str] = &["You can press 'q' to finish early"];

pub struct SpinnerHandle {
    pub spinner: ProgressBar,
    tx: Sender<String>,
}

impl SpinnerHandle {
    pub fn send_to_queue(&self, message: String) {
        let _ = self.tx.send(message);
    }

    pub fn println(&self, msg: &str) {
        self.spinner.println(msg);
    }

    pub fn finish_and_clear(&self) {
        self.spinner.finish_and_clear();
    }

    /// Lines can only go above a bar that is still drawn.
    fn is_drawing(&self) -> bool {
        !self.spinner.is_finished() && !self.spinner.is_hidden()
    }
}

static SPINNER: OnceLock<SpinnerHandle> = OnceLock::new();

/// Starts the discovery spinner. Later calls return the running one.
pub fn start_discovery_spinner(show_tips: bool) -> &'static SpinnerHandle {
    SPINNER.get_or_init(|| init_spinner(show_tips))
}

pub fn finish_discovery_spinner() {
    if let Some(handle) = SPINNER.get() {
        handle.finish_and_clear();
    }
}

fn init_spinner(show_tips: bool) -> SpinnerHandle {
    let pb = ProgressBar::new_spinner();
    let style = match ProgressStyle::with_template("{spinner:.blue} {msg}") {
        Ok(style) => style,
        Err(_) => ProgressStyle::default_spinner(),
    }
    .tick_strings(&[
        "▁▁▁▁▁",
        "▁▂▂▂▁",
        "▁▄▂▄▁",
        "▂▄▆▄▂",
        "▄▆█▆▄",
        "▂▄▆▄▂",
        "▁▄▂▄▁",
        "▁▂▂▂▁",
    ]);

    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));

    let (tx, rx) = mpsc::channel::<String>();
    let pb_clone = pb.clone();

    thread::spawn(move || {
        let mut tip_index = 0;
        let mut next_action_time = Instant::now() + TIP_DURATION;
        let mut is_showing_tip = false;
        let mut last_tip_time = Instant::now();

        loop {
            if pb_clone.is_finished() {
                break;
            }

            let wait_time = next_action_time.saturating_duration_since(Instant::now());

            match rx.recv_timeout(wait_time) {
                Ok(mut msg) => {
                    if is_showing_tip {
                        let elapsed = last_tip_time.elapsed();
                        if elapsed < MIN_TIP_VISIBILITY {
                            thread::sleep(MIN_TIP_VISIBILITY - elapsed);
                        }
                        is_showing_tip = false;
                    }
                    while let Ok(newer_msg) = rx.try_recv() {
                        msg = newer_msg;
                    }
                    pb_clone.set_message(msg);
                    next_action_time = Instant::now() + MESSAGE_READ_TIME;
                }
                Err(RecvTimeoutError::Timeout) if show_tips => {
                    let tip = TIPS[tip_index % TIPS.len()];
                    pb_clone.set_message(format!("{}", tip.italic().white()));

                    tip_index += 1;
                    is_showing_tip = true;
                    last_tip_time = Instant::now();

                    next_action_time = Instant::now() + TIP_DURATION;
                }
                Err(RecvTimeoutError::Timeout) => {
                    next_action_time = Instant::now() + TIP_DURATION;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    break;
                }
            }
        }
    });

    SpinnerHandle { spinner: pb, tx }
}

pub fn report_discovery_progress(scanned: usize, total: u64, found: usize) {
    if let Some(handle) = SPINNER.get() {
        handle.send_to_queue(format!(
            "Scanned {scanned}/{total} hosts, identified {} accessories so far...",
            found.to_string().green().bold()
        ));
    }
}

/// Console sink for log lines. Keeps them above the spinner while it runs
/// and falls back to stdout otherwise.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match SPINNER.get() {
            Some(handle) if handle.is_drawing() => {
                let msg = String::from_utf8_lossy(buf);
                handle.println(msg.trim_end());
                Ok(buf.len())
            }
            _ => std::io::stdout().write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()
    }
}
