//! One-shot completion signal.
//!
//! A [`SignalHandle`] starts open and becomes closed exactly once, when its
//! [`SignalCloser`] is closed or dropped. Dropping counts as closing so a
//! worker that dies early cannot leave a waiter blocked forever.

use tokio::sync::watch;

/// Create a linked closer/handle pair. The handle starts open.
pub fn signal_pair() -> (SignalCloser, SignalHandle) {
    let (tx, rx) = watch::channel(false);
    (SignalCloser { tx }, SignalHandle { rx })
}

/// Owned by the side doing the asynchronous work.
#[derive(Debug)]
pub struct SignalCloser {
    tx: watch::Sender<bool>,
}

impl SignalCloser {
    /// Mark the work as finished.
    pub fn close(self) {
        // No receivers left is fine; nobody is waiting.
        let _ = self.tx.send(true);
    }
}

/// Observed by whoever must wait for the work to finish.
#[derive(Debug, Clone)]
pub struct SignalHandle {
    rx: watch::Receiver<bool>,
}

impl SignalHandle {
    /// A handle with no pending work.
    pub fn closed() -> Self {
        let (closer, handle) = signal_pair();
        closer.close();
        handle
    }

    /// Non-blocking check.
    pub fn is_closed(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Wait until the handle is closed. There is no timeout.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
