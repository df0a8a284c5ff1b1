//! Test: engine signal loop - FIFO processing, refresh semantics

use crate::helpers::*;
use pitstop::adapter::PlatformAdapter;
use pitstop::engine::{shutdown, CoreEngine, EngineError, Signal};
use std::sync::Arc;
use tokio::sync::mpsc;

async fn engine_with(
    dir: &tempfile::TempDir,
    parses: Vec<Result<pitstop::Blueprint, String>>,
) -> (CoreEngine, shutdown::ShutdownHandle) {
    let (handle, token) = shutdown::channel();
    let adapters: Vec<Arc<dyn PlatformAdapter>> = vec![Arc::new(MockAdapter::new(parses))];
    let engine = CoreEngine::initialize(dir.path().to_path_buf(), adapters, token)
        .await
        .expect("engine init");
    (engine, handle)
}

/// The reference scenario: two FileChange signals queued behind an in-flight
/// run are both processed, in order, and no runs overlap. Runs execute
/// inline in the loop, so ordering in the log is the whole proof.
#[tokio::test]
async fn test_queued_file_changes_are_processed_in_order() {
    let dir = mock_project();
    let bp = blueprint(vec![job(
        "j1",
        vec![step("j1.s1", "echo run >> log.txt")],
    )]);
    let (mut engine, _handle) = engine_with(&dir, vec![Ok(bp)]).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    for name in ["a.rs", "b.rs", "c.rs"] {
        tx.send(Signal::FileChange(dir.path().join(name)))
            .expect("queue signal");
    }
    drop(tx);

    engine.run_signal_loop(&mut rx).await;

    assert_eq!(read_log(dir.path()), "run\nrun\nrun\n");
}

/// Refresh swaps the snapshot; subsequent runs see the new blueprint.
#[tokio::test]
async fn test_refresh_then_run_uses_new_blueprint() {
    let dir = mock_project();
    let first = blueprint(vec![job("j1", vec![step("j1.s1", "echo old >> log.txt")])]);
    let second = blueprint(vec![job("j1", vec![step("j1.s1", "echo new >> log.txt")])]);
    let (mut engine, _handle) = engine_with(&dir, vec![Ok(first), Ok(second)]).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(Signal::FileChange(dir.path().join("a.rs")))
        .expect("queue signal");
    tx.send(Signal::Refresh(dir.path().join(MOCK_PIPELINE_FILE)))
        .expect("queue signal");
    tx.send(Signal::FileChange(dir.path().join("b.rs")))
        .expect("queue signal");
    drop(tx);

    engine.run_signal_loop(&mut rx).await;

    assert_eq!(read_log(dir.path()), "old\nnew\n");
}

/// A refresh that fails to parse leaves the last-good blueprint running.
#[tokio::test]
async fn test_broken_refresh_keeps_last_good_blueprint() {
    let dir = mock_project();
    let bp = blueprint(vec![job("j1", vec![step("j1.s1", "echo good >> log.txt")])]);
    let (mut engine, _handle) =
        engine_with(&dir, vec![Ok(bp), Err("unparsable".to_string())]).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(Signal::Refresh(dir.path().join(MOCK_PIPELINE_FILE)))
        .expect("queue signal");
    tx.send(Signal::FileChange(dir.path().join("a.rs")))
        .expect("queue signal");
    drop(tx);

    engine.run_signal_loop(&mut rx).await;

    // The run after the failed refresh still used the original blueprint.
    assert_eq!(read_log(dir.path()), "good\n");
}

/// A project no adapter recognizes is a fatal startup error.
#[tokio::test]
async fn test_unrecognized_project_fails_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_handle, token) = shutdown::channel();
    let adapters: Vec<Arc<dyn PlatformAdapter>> = vec![Arc::new(MockAdapter::new(vec![]))];

    let result = CoreEngine::initialize(dir.path().to_path_buf(), adapters, token).await;
    assert!(matches!(result, Err(EngineError::NoCompatiblePlatform(_))));
}
