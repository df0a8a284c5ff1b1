//! Debug pause - resumable handles for runs suspended after a step

use crate::engine::shutdown::Shutdown;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

/// How a pause ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// An external continue signal arrived
    Resumed,
    /// Shutdown was requested while paused
    Cancelled,
}

/// Registry of paused runs, keyed by run id
///
/// A paused run parks on its own wakeup handle; an external control surface
/// (signal handler, IPC endpoint) resolves it with [`PauseGate::resume`].
/// Nothing here blocks the watcher or other queued work, and no terminal
/// read is involved.
#[derive(Debug, Default)]
pub struct PauseGate {
    waiters: Mutex<HashMap<Uuid, Arc<Notify>>>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block the calling run until resumed or shutdown
    pub async fn wait(&self, run_id: Uuid, shutdown: &Shutdown) -> PauseOutcome {
        let notify = {
            let mut waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
            waiters
                .entry(run_id)
                .or_insert_with(|| Arc::new(Notify::new()))
                .clone()
        };

        let outcome = tokio::select! {
            _ = notify.notified() => PauseOutcome::Resumed,
            _ = shutdown.triggered() => PauseOutcome::Cancelled,
        };

        let mut waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
        waiters.remove(&run_id);
        outcome
    }

    /// Deliver a continue signal to a specific paused run
    ///
    /// Returns false when no run with that id is paused. A permit is stored
    /// if resume races ahead of the wait, so the wakeup is never lost.
    pub fn resume(&self, run_id: Uuid) -> bool {
        let waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
        match waiters.get(&run_id) {
            Some(notify) => {
                notify.notify_one();
                true
            }
            None => false,
        }
    }

    /// Resume every currently paused run; returns how many were signalled
    pub fn resume_all(&self) -> usize {
        let waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
        for notify in waiters.values() {
            notify.notify_one();
        }
        waiters.len()
    }

    /// Ids of currently paused runs
    pub fn paused_runs(&self) -> Vec<Uuid> {
        let waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
        waiters.keys().copied().collect()
    }
}
