//! Keyboard listener that lets the user end a scan early with `q`.
//!
//! Raw mode swallows the terminal's own Ctrl-C handling, so Ctrl-C is
//! treated the same as `q` while the listener runs.

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tadisc_core::CancelHandle;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct InputHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InputHandle {
    /// Starts listening when stdin is an interactive terminal. Returns
    /// `None` otherwise, e.g. when the scan runs from a script.
    pub fn start(cancel: CancelHandle) -> Option<Self> {
        if !std::io::stdin().is_terminal() {
            return None;
        }

        if let Err(e) = enable_raw_mode() {
            warn!("keyboard input unavailable: {e}");
            return None;
        }

        let stop: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
        let stop_flag: Arc<AtomicBool> = Arc::clone(&stop);

        let thread: JoinHandle<()> = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) && !cancel.is_cancelled() {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(_) => break,
                }

                if let Ok(Event::Key(key_event)) = event::read() {
                    if key_event.kind != KeyEventKind::Press {
                        continue;
                    }

                    let is_q: bool = key_event.code == KeyCode::Char('q');
                    let is_ctrl_c: bool = key_event.code == KeyCode::Char('c')
                        && key_event.modifiers.contains(KeyModifiers::CONTROL);

                    if is_q || is_ctrl_c {
                        info!("stop requested from keyboard");
                        cancel.cancel();
                        break;
                    }
                }
            }
        });

        Some(Self {
            stop,
            thread: Some(thread),
        })
    }
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        let _ = disable_raw_mode();
    }
}
