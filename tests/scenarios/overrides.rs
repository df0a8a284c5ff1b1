//! Test: step overrides - skip and pause_after actions

use crate::helpers::*;
use pitstop::blueprint::{StepAction, StepOverrides};
use pitstop::engine::shutdown;
use pitstop::execution::{Orchestrator, PauseGate, RunOutcome};
use std::sync::Arc;
use std::time::Duration;

/// The reference scenario with S2 overridden to skip: the run SUCCEEDS, S2
/// is skipped and S3 executes.
#[tokio::test]
async fn test_skip_override_rescues_a_failing_run() {
    let dir = mock_project();
    let bp = blueprint(vec![
        job(
            "j1",
            vec![step("j1.s1", "echo ok >> log.txt"), step("j1.s2", "exit 1")],
        ),
        job("j2", vec![step("j2.s3", "echo s3 >> log.txt")]),
    ]);

    let report = run_blueprint(
        dir.path(),
        bp,
        overrides(&[("j1.s2", StepAction::Skip)]),
    )
    .await;

    assert_run_succeeded(&report);
    assert_eq!(report.skipped_steps, vec!["j1.s2"]);
    assert_eq!(report.executed_steps, vec!["j1.s1", "j2.s3"]);
    assert_eq!(read_log(dir.path()), "ok\ns3\n");
}

/// A skipped step never spawns a subprocess, whatever its condition says.
#[tokio::test]
async fn test_skip_never_executes_under_any_condition() {
    for condition in [None, Some("true"), Some("false")] {
        let dir = mock_project();
        let mut gated = step("j1.s1", "echo no >> log.txt");
        gated.run_condition = condition.map(str::to_string);
        let bp = blueprint(vec![job("j1", vec![gated])]);

        let report = run_blueprint(
            dir.path(),
            bp,
            overrides(&[("j1.s1", StepAction::Skip)]),
        )
        .await;

        assert_run_succeeded(&report);
        assert_eq!(read_log(dir.path()), "", "condition {:?}", condition);
    }
}

/// A pause_after step blocks the run until resumed, then the run finishes.
#[tokio::test]
async fn test_pause_after_suspends_until_continue_signal() {
    let dir = mock_project();
    let bp = blueprint(vec![job(
        "j1",
        vec![
            step("j1.s1", "echo paused >> log.txt"),
            step("j1.s2", "echo done >> log.txt"),
        ],
    )]);

    let (_handle, shutdown) = shutdown::channel();
    let pause = Arc::new(PauseGate::new());
    let orchestrator = Orchestrator::new(
        dir.path().to_path_buf(),
        Arc::new(MockAdapter::new(vec![])),
        Arc::new(bp),
        Arc::new(overrides(&[("j1.s1", StepAction::PauseAfter)])),
        pause.clone(),
        shutdown,
    );
    let run_id = orchestrator.run_id();
    let root = dir.path().to_path_buf();

    let task = tokio::spawn(async move { orchestrator.run().await });

    // The run must reach the pause with only the first step done.
    let mut paused = false;
    for _ in 0..200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if pause.paused_runs().contains(&run_id) {
            paused = true;
            break;
        }
    }
    assert!(paused, "run never paused");
    assert_eq!(read_log(&root), "paused\n");

    assert!(pause.resume(run_id));
    let report = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("run did not finish after resume")
        .expect("run task panicked");

    assert_run_succeeded(&report);
    assert_eq!(read_log(&root), "paused\ndone\n");
}

/// Shutdown while paused aborts the run as a cancellation, not a failure.
#[tokio::test]
async fn test_shutdown_while_paused_is_cancellation() {
    let dir = mock_project();
    let bp = blueprint(vec![job(
        "j1",
        vec![step("j1.s1", "echo ok"), step("j1.s2", "echo never")],
    )]);

    let (handle, shutdown) = shutdown::channel();
    let pause = Arc::new(PauseGate::new());
    let orchestrator = Orchestrator::new(
        dir.path().to_path_buf(),
        Arc::new(MockAdapter::new(vec![])),
        Arc::new(bp),
        Arc::new(overrides(&[("j1.s1", StepAction::PauseAfter)])),
        pause.clone(),
        shutdown,
    );

    let task = tokio::spawn(async move { orchestrator.run().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.trigger();

    let report = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("run did not stop on shutdown")
        .expect("run task panicked");
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.failed_step.is_none());
}

/// Overrides loaded from the config file apply by step id.
#[tokio::test]
async fn test_overrides_loaded_from_file() {
    let dir = mock_project();
    let pipeline_file = dir.path().join(MOCK_PIPELINE_FILE);
    std::fs::write(
        StepOverrides::path_for(&pipeline_file),
        "j1.s2:\n  action: skip\n",
    )
    .expect("override file write");

    let loaded = StepOverrides::load_for(&pipeline_file).expect("override load");
    let bp = blueprint(vec![job(
        "j1",
        vec![step("j1.s1", "echo ok >> log.txt"), step("j1.s2", "exit 1")],
    )]);

    let report = run_blueprint(dir.path(), bp, loaded).await;
    assert_run_succeeded(&report);
    assert_eq!(read_log(dir.path()), "ok\n");
}
