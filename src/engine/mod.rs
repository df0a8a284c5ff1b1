//! Core engine - adapter selection, snapshot lifecycle and the signal loop

pub mod shutdown;
pub mod watcher;

pub use shutdown::{Shutdown, ShutdownHandle};
pub use watcher::{ProjectWatcher, Signal, WatchTargets};

use crate::adapter::{select_adapter, AdapterError, PlatformAdapter};
use crate::blueprint::{Blueprint, OverrideError, StepOverrides};
use crate::execution::{Orchestrator, PauseGate, RunReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info, warn};

/// Engine lifecycle errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no compatible CI platform found under {0}")]
    NoCompatiblePlatform(PathBuf),

    #[error("pipeline parse failed: {0}")]
    Parse(#[from] AdapterError),

    #[error("override config load failed: {0}")]
    ConfigLoad(#[from] OverrideError),

    #[error("filesystem watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Engine lifecycle states, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Watching,
    ShuttingDown,
}

/// An immutable Blueprint/overrides pair
///
/// Replaced wholesale on refresh; every run captures its own clone of the
/// Arcs, so a refresh during an in-flight run cannot change that run's view.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub blueprint: Arc<Blueprint>,
    pub overrides: Arc<StepOverrides>,
}

/// Owns the active adapter, the current snapshot and the signal loop
pub struct CoreEngine {
    project_root: PathBuf,
    adapter: Arc<dyn PlatformAdapter>,
    pipeline_file: PathBuf,
    snapshot: Snapshot,
    pause: Arc<PauseGate>,
    shutdown: Shutdown,
    state: EngineState,
}

impl CoreEngine {
    /// Select an adapter and perform the initial load
    ///
    /// Both the parse and the override-config load must succeed here; a
    /// failure during startup is fatal, unlike the same failure on a later
    /// refresh.
    pub async fn initialize(
        project_root: PathBuf,
        adapters: Vec<Arc<dyn PlatformAdapter>>,
        shutdown: Shutdown,
    ) -> Result<Self, EngineError> {
        debug!(state = ?EngineState::Initializing, "engine initializing");

        let adapter = select_adapter(&adapters, &project_root)
            .ok_or_else(|| EngineError::NoCompatiblePlatform(project_root.clone()))?;
        info!(platform = adapter.name(), "selected platform adapter");

        let pipeline_file = adapter.pipeline_file(&project_root).ok_or_else(|| {
            EngineError::Parse(AdapterError::MissingPipelineFile(project_root.clone()))
        })?;

        let snapshot = Self::load(adapter.as_ref(), &project_root, &pipeline_file).await?;
        info!(
            pipeline = %pipeline_file.display(),
            jobs = snapshot.blueprint.jobs.len(),
            steps = snapshot.blueprint.step_count(),
            overrides = snapshot.overrides.len(),
            "blueprint loaded"
        );

        Ok(Self {
            project_root,
            adapter,
            pipeline_file,
            snapshot,
            pause: Arc::new(PauseGate::new()),
            shutdown,
            state: EngineState::Initializing,
        })
    }

    async fn load(
        adapter: &dyn PlatformAdapter,
        project_root: &Path,
        pipeline_file: &Path,
    ) -> Result<Snapshot, EngineError> {
        let blueprint = adapter.parse(project_root).await?;
        let overrides = StepOverrides::load_for(pipeline_file)?;
        Ok(Snapshot {
            blueprint: Arc::new(blueprint),
            overrides: Arc::new(overrides),
        })
    }

    /// The platform tag of the active adapter
    pub fn platform(&self) -> &'static str {
        self.adapter.name()
    }

    /// The current snapshot pair
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The gate through which paused runs are resumed
    pub fn pause_gate(&self) -> Arc<PauseGate> {
        self.pause.clone()
    }

    /// Execute one run against the current snapshot
    pub async fn run_current(&self) -> RunReport {
        let orchestrator = Orchestrator::new(
            self.project_root.clone(),
            self.adapter.clone(),
            self.snapshot.blueprint.clone(),
            self.snapshot.overrides.clone(),
            self.pause.clone(),
            self.shutdown.clone(),
        );
        orchestrator.run().await
    }

    /// Watch the project tree and drive the signal loop until shutdown
    pub async fn watch(mut self) -> Result<(), EngineError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let targets = WatchTargets {
            project_root: self.project_root.clone(),
            pipeline_file: self.pipeline_file.clone(),
            overrides_file: StepOverrides::path_for(&self.pipeline_file),
        };
        let _watcher = ProjectWatcher::spawn(targets, tx)?;

        self.state = EngineState::Watching;
        info!(
            root = %self.project_root.display(),
            state = ?self.state,
            "watching for changes"
        );

        self.run_signal_loop(&mut rx).await;

        self.state = EngineState::ShuttingDown;
        info!(state = ?self.state, "engine stopped");
        Ok(())
    }

    /// Drain signals in arrival order until shutdown or queue closure
    ///
    /// Runs execute inline, so signals arriving during a run simply queue
    /// behind it: strict FIFO, never two runs at once, and a new trigger
    /// never interrupts the run in flight.
    pub async fn run_signal_loop(&mut self, rx: &mut UnboundedReceiver<Signal>) {
        loop {
            let signal = tokio::select! {
                _ = self.shutdown.triggered() => break,
                signal = rx.recv() => match signal {
                    Some(signal) => signal,
                    None => break,
                },
            };
            // Per-signal containment: nothing a signal does may stop the
            // loop itself.
            self.handle_signal(signal).await;
        }
    }

    /// Handle one signal; errors are logged, never propagated
    pub async fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Refresh(path) => {
                info!(path = %path.display(), "pipeline definition changed, refreshing");
                match Self::load(self.adapter.as_ref(), &self.project_root, &self.pipeline_file)
                    .await
                {
                    Ok(snapshot) => {
                        info!(
                            jobs = snapshot.blueprint.jobs.len(),
                            steps = snapshot.blueprint.step_count(),
                            overrides = snapshot.overrides.len(),
                            "blueprint refreshed"
                        );
                        self.snapshot = snapshot;
                    }
                    Err(e) => {
                        // The previous snapshot pair stays authoritative.
                        warn!("refresh failed, keeping last good blueprint: {}", e);
                    }
                }
            }
            Signal::FileChange(path) => {
                debug!(path = %path.display(), "file change");
                let report = self.run_current().await;
                if let Some(failed) = &report.failed_step {
                    error!(run = %report.run_id, step = %failed, "run halted by step failure");
                }
            }
        }
    }
}
