//! Cooperative shutdown signal shared by the engine, runs and subprocesses

use tokio::sync::watch;

/// Create a linked shutdown handle/token pair
pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

/// The triggering side, held by process-level lifecycle code
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Request shutdown; all clones of the paired token observe it
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// The observing side, cloned into every task that must stop cooperatively
///
/// Dropping the handle without triggering counts as shutdown, so orphaned
/// tokens can never hang a wait.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Whether shutdown has been requested
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Suspend until shutdown is requested
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped; treat as shutdown.
                return;
            }
        }
    }
}
