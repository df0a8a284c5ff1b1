//! Filesystem watcher - turns file events into engine signals

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Noise directories whose contents never trigger anything
///
/// Version-control and IDE metadata churn constantly without the project
/// itself changing.
pub const IGNORED_DIRS: &[&str] = &[".git", ".hg", ".svn", ".idea", ".vscode"];

/// What the engine should do about an observed change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A project file changed: trigger a run
    FileChange(PathBuf),
    /// The pipeline definition or its override config changed: re-parse,
    /// do not execute
    Refresh(PathBuf),
}

/// The paths the watcher classifies against
#[derive(Debug, Clone)]
pub struct WatchTargets {
    pub project_root: PathBuf,
    pub pipeline_file: PathBuf,
    pub overrides_file: PathBuf,
}

/// Classify one event path into a signal, or ignore it
pub fn classify(targets: &WatchTargets, path: &Path) -> Option<Signal> {
    if path == targets.pipeline_file || path == targets.overrides_file {
        return Some(Signal::Refresh(path.to_path_buf()));
    }

    let relative = path.strip_prefix(&targets.project_root).unwrap_or(path);
    let ignored = relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
    });
    if ignored {
        return None;
    }

    Some(Signal::FileChange(path.to_path_buf()))
}

fn is_mutation(kind: &EventKind) -> bool {
    // Creates, modifies, removes and renames; access events are noise.
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Recursive watcher over the project root
///
/// The notify callback runs on the watcher's own thread and pushes signals
/// into the engine's queue; the queue is the only synchronization point
/// between the two.
pub struct ProjectWatcher {
    // Dropping the watcher stops the event stream.
    _watcher: RecommendedWatcher,
}

impl ProjectWatcher {
    pub fn spawn(
        targets: WatchTargets,
        tx: UnboundedSender<Signal>,
    ) -> Result<Self, notify::Error> {
        let root = targets.project_root.clone();
        let mut watcher =
            notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("watch error: {}", e);
                        return;
                    }
                };

                if !is_mutation(&event.kind) {
                    return;
                }

                for path in &event.paths {
                    match classify(&targets, path) {
                        Some(signal) => {
                            debug!("{:?} -> {:?}", path, signal);
                            // Send fails only when the engine is gone.
                            let _ = tx.send(signal);
                        }
                        None => debug!("{:?} ignored", path),
                    }
                }
            })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        Ok(Self { _watcher: watcher })
    }
}
