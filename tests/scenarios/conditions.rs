//! Test: condition evaluation - skips are not failures, gaps fail open

use crate::helpers::*;
use pitstop::blueprint::StepOverrides;

/// A job whose condition is false skips every step it contains and the run
/// continues with the next job.
#[tokio::test]
async fn test_false_job_condition_skips_whole_job() {
    let dir = mock_project();
    let mut gated = job(
        "nightly",
        vec![
            step("nightly.s1", "echo n1 >> log.txt"),
            step("nightly.s2", "echo n2 >> log.txt"),
        ],
    );
    gated.run_condition = Some("false".to_string());
    let bp = blueprint(vec![
        gated,
        job("ci", vec![step("ci.s1", "echo ci >> log.txt")]),
    ]);

    let report = run_blueprint(dir.path(), bp, StepOverrides::empty()).await;

    assert_run_succeeded(&report);
    assert_eq!(report.skipped_steps, vec!["nightly.s1", "nightly.s2"]);
    assert_eq!(report.executed_steps, vec!["ci.s1"]);
    assert_eq!(read_log(dir.path()), "ci\n");
}

/// A step whose condition is false is skipped without failing the run.
#[tokio::test]
async fn test_false_step_condition_is_not_a_failure() {
    let dir = mock_project();
    let mut gated = step("j1.gated", "echo gated >> log.txt");
    gated.run_condition = Some("false".to_string());
    let bp = blueprint(vec![job(
        "j1",
        vec![gated, step("j1.open", "echo open >> log.txt")],
    )]);

    let report = run_blueprint(dir.path(), bp, StepOverrides::empty()).await;

    assert_run_succeeded(&report);
    assert_eq!(report.skipped_steps, vec!["j1.gated"]);
    assert_eq!(read_log(dir.path()), "open\n");
}

/// Syntax the adapter cannot interpret fails open: the step runs.
#[tokio::test]
async fn test_uninterpretable_condition_fails_open() {
    let dir = mock_project();
    let mut gated = step("j1.s1", "echo ran >> log.txt");
    gated.run_condition = Some("some && exotic(syntax)".to_string());
    let bp = blueprint(vec![job("j1", vec![gated])]);

    let report = run_blueprint(dir.path(), bp, StepOverrides::empty()).await;

    assert_run_succeeded(&report);
    assert_eq!(report.executed_steps, vec!["j1.s1"]);
    assert_eq!(read_log(dir.path()), "ran\n");
}

/// The job environment is visible to the step's subprocess.
#[tokio::test]
async fn test_job_environment_reaches_commands() {
    let dir = mock_project();
    let mut envjob = job("j1", vec![step("j1.s1", "echo $TAG >> log.txt")]);
    envjob.environment = vec![("TAG".to_string(), "v42".to_string())];
    let bp = blueprint(vec![envjob]);

    let report = run_blueprint(dir.path(), bp, StepOverrides::empty()).await;

    assert_run_succeeded(&report);
    assert_eq!(read_log(dir.path()), "v42\n");
}
