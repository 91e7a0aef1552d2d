use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use lanprobe_core::CancellationToken;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Requests cancellation when `q` or Ctrl-C is pressed.
///
/// The terminal is in raw mode while the handle lives, so Ctrl-C arrives
/// as a key event rather than a signal. Dropping the handle restores it.
pub struct CancelKeys {
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl CancelKeys {
    pub fn start(cancel: CancellationToken) -> Self {
        let stop: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let worker = thread::spawn(move || {
            if let Err(e) = enable_raw_mode() {
                debug!("Keyboard cancellation unavailable: {e}");
                return;
            }
            while !stop_flag.load(Ordering::Relaxed) {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key_event)) if is_cancel_key(&key_event) => {
                            cancel.cancel();
                            break;
                        }
                        _ => {}
                    },
                    Ok(false) => {}
                    Err(_) => break,
                }
            }
            let _ = disable_raw_mode();
        });

        Self {
            stop,
            worker: Some(worker),
        }
    }
}

impl Drop for CancelKeys {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        let _ = disable_raw_mode();
    }
}

pub fn is_cancel_key(key_event: &KeyEvent) -> bool {
    let is_q = key_event.code == KeyCode::Char('q');
    let is_ctrl_c =
        key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL);

    (is_q || is_ctrl_c) && key_event.kind == KeyEventKind::Press
}

/// Without keyboard input, Ctrl-C is still honoured through the signal.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
