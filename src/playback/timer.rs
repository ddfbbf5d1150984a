//! Cancellable fixed-cadence polling timer
//!
//! The synchronizer needs one recurring scheduled operation: a tick every
//! poll interval while speech plays. `PollTimer` wraps a worker thread on a
//! crossbeam ticker with cancellation as a first-class operation:
//! idempotent, observable, and joining the worker so no tick can run after
//! `cancel` returns.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, tick, Sender};
use crossbeam::select;
use tracing::trace;

/// Handle to a running polling timer
pub struct PollTimer {
    stop_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
    cancelled: bool,
}

impl PollTimer {
    /// Arm a timer calling `callback` every `period`
    ///
    /// The callback returns whether to keep ticking; returning `false`
    /// stops the timer from inside, which is how playback ends without
    /// having to cancel itself.
    pub fn spawn<F>(period: Duration, mut callback: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticker = tick(period);

        let worker = thread::spawn(move || loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> msg => {
                    if msg.is_err() || !callback() {
                        break;
                    }
                }
            }
        });

        Self {
            stop_tx,
            worker: Some(worker),
            cancelled: false,
        }
    }

    /// Cancel the timer and wait for the worker to stop
    ///
    /// Returns `true` only on the call that performs the cancellation;
    /// cancelling an already-cancelled timer is a no-op returning `false`.
    pub fn cancel(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;
        // The worker may already have stopped itself; a dead channel is fine.
        let _ = self.stop_tx.try_send(());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        trace!("poll timer cancelled");
        true
    }

    /// Whether `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
