//! Dedicated OS-thread hotkey listener using `rdev::listen`.
//!
//! # Shutdown caveat
//!
//! `rdev::listen` has **no graceful shutdown API**.  Dropping the
//! [`HotkeyListener`] sets a stop flag so events are no longer forwarded,
//! but the OS thread stays blocked in the rdev event loop until the process
//! exits.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::pipeline::Command;

use super::HotkeyBindings;

/// Handle to a running hotkey listener thread.  Drop it to stop forwarding.
pub struct HotkeyListener {
    stop: Arc<AtomicBool>,
    /// Never joined: `rdev::listen` does not return.
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Spawn the listener thread.  Presses of bound keys are forwarded on
    /// `tx`; key releases and unbound keys are ignored.
    ///
    /// A press that finds the queue full is dropped.
    pub fn start(bindings: HotkeyBindings, tx: mpsc::Sender<Command>) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }
                    let rdev::EventType::KeyPress(key) = event.event_type else {
                        return;
                    };
                    let Some(command) = bindings.command_for(key) else {
                        return;
                    };

                    log::debug!("hotkey: {key:?} → {command:?}");
                    match tx.try_send(command) {
                        Ok(()) => {}
                        Err(TrySendError::Full(dropped)) => {
                            log::debug!("hotkey: queue full, dropping {dropped:?}");
                        }
                        Err(TrySendError::Closed(_)) => {}
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                }
            })?;

        Ok(Self {
            stop,
            _thread: thread,
        })
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
