//! Process-wide shutdown state.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `LISTENING`: Has a session taken the shutdown receiver?

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

static LISTENING: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for the actor system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Shutdown signal receiver, handed out to the session runner
static SHUTDOWN_RX: OnceLock<crossbeam::channel::Receiver<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The first Ctrl+C notifies the running session so it can dispose its editor
/// instances; with no session listening the process exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    let (tx, rx) = crossbeam::channel::bounded(1);
    let _ = SHUTDOWN_TX.set(tx);
    let _ = SHUTDOWN_RX.set(rx);

    ctrlc::set_handler(|| {
        let already = SHUTDOWN.swap(true, Ordering::SeqCst);
        let listening = LISTENING.load(Ordering::SeqCst);
        if exits_now(already, listening, || {
            SHUTDOWN_TX
                .get()
                .is_some_and(|tx| tx.try_send(()).is_ok())
        }) {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Receiver that yields once Ctrl+C has been pressed.
///
/// Taking it marks the process as having a session that handles Ctrl+C.
pub fn shutdown_signal() -> Option<crossbeam::channel::Receiver<()>> {
    let rx = SHUTDOWN_RX.get().cloned();
    if rx.is_some() {
        LISTENING.store(true, Ordering::SeqCst);
    }
    rx
}

/// A second press, or a press nobody listens for, ends the process.
fn exits_now(already: bool, listening: bool, deliver: impl FnOnce() -> bool) -> bool {
    already || !listening || !deliver()
}
