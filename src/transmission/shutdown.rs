// Cancellation signal passed explicitly to the worker and the ingest server.
// Nothing is ever sent on the channel: firing drops the only sender, which
// every receiver observes as a disconnect.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

pub struct ShutdownTrigger {
    _tx: Sender<()>,
}

#[derive(Clone)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    (ShutdownTrigger { _tx: tx }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    /// Dropping the trigger has the same effect.
    pub fn fire(self) {}
}

impl ShutdownSignal {
    pub fn is_fired(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep up to `timeout`; returns true as soon as the signal fires.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// For use in `select!`: becomes ready (disconnected) once fired.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
