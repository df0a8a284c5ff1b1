//! Test: fail-fast - a failing command halts everything after it

use crate::helpers::*;
use pitstop::blueprint::StepOverrides;

/// The reference scenario: J1 { S1 ok, S2 exit 1 }, J2 { S3 } - S1 succeeds,
/// S2 fails, the run is FAILED and S3 never executes.
#[tokio::test]
async fn test_failing_step_halts_run_and_later_jobs() {
    let dir = mock_project();
    let bp = blueprint(vec![
        job(
            "j1",
            vec![step("j1.s1", "echo ok >> log.txt"), step("j1.s2", "exit 1")],
        ),
        job("j2", vec![step("j2.s3", "echo never >> log.txt")]),
    ]);

    let report = run_blueprint(dir.path(), bp, StepOverrides::empty()).await;

    assert_run_failed_at(&report, "j1.s2");
    assert_eq!(report.executed_steps, vec!["j1.s1"]);
    assert_eq!(read_log(dir.path()), "ok\n");
}

/// Steps before the failing one still report as executed and succeeded.
#[tokio::test]
async fn test_steps_before_failure_are_reported_executed() {
    let dir = mock_project();
    let bp = blueprint(vec![job(
        "j1",
        vec![
            step("j1.a", "echo a >> log.txt"),
            step("j1.b", "echo b >> log.txt"),
            step("j1.c", "false"),
            step("j1.d", "echo d >> log.txt"),
        ],
    )]);

    let report = run_blueprint(dir.path(), bp, StepOverrides::empty()).await;

    assert_run_failed_at(&report, "j1.c");
    assert_eq!(report.executed_steps, vec!["j1.a", "j1.b"]);
    assert_eq!(read_log(dir.path()), "a\nb\n");
}

/// A failing command stops the remaining commands of its own step too.
#[tokio::test]
async fn test_failure_stops_remaining_commands_in_step() {
    let dir = mock_project();
    let mut failing = step("j1.s1", "echo first >> log.txt");
    if let pitstop::blueprint::TaskDefinition::Shell { commands } = &mut failing.task {
        commands.push("exit 3".to_string());
        commands.push("echo tail >> log.txt".to_string());
    }
    let bp = blueprint(vec![job("j1", vec![failing])]);

    let report = run_blueprint(dir.path(), bp, StepOverrides::empty()).await;

    assert_run_failed_at(&report, "j1.s1");
    assert_eq!(read_log(dir.path()), "first\n");
}

/// A fully green multi-job blueprint reports every step in order.
#[tokio::test]
async fn test_green_run_executes_everything_in_order() {
    let dir = mock_project();
    let bp = blueprint(vec![
        job(
            "build",
            vec![
                step("build.compile", "echo compile >> log.txt"),
                step("build.test", "echo test >> log.txt"),
            ],
        ),
        job("deploy", vec![step("deploy.ship", "echo ship >> log.txt")]),
    ]);

    let report = run_blueprint(dir.path(), bp, StepOverrides::empty()).await;

    assert_run_succeeded(&report);
    assert_eq!(
        report.executed_steps,
        vec!["build.compile", "build.test", "deploy.ship"]
    );
    assert_eq!(read_log(dir.path()), "compile\ntest\nship\n");
}
