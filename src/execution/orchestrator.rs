//! Per-run interpreter - walks one Blueprint to completion or first failure

use crate::adapter::PlatformAdapter;
use crate::blueprint::{Blueprint, ExecutionContext, StepAction, StepOverrides};
use crate::engine::shutdown::Shutdown;
use crate::execution::pause::{PauseGate, PauseOutcome};
use crate::execution::shell::{ExecutionError, ShellRunner};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Terminal state of one run
///
/// Cancellation is reported distinctly from failure: an aborted run was not
/// wrong, it was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

/// What happened during one run, for callers and tests
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Step ids that executed and succeeded, in order
    pub executed_steps: Vec<String>,
    /// Step ids skipped by override or condition, in order
    pub skipped_steps: Vec<String>,
    /// The step that halted the run, if any
    pub failed_step: Option<String>,
}

/// Interprets exactly one Blueprint snapshot
///
/// Created per run and discarded afterwards; it never mutates the Blueprint
/// and holds its own references to the snapshot pair, so a concurrent
/// refresh cannot change what this run sees.
pub struct Orchestrator {
    run_id: Uuid,
    adapter: Arc<dyn PlatformAdapter>,
    blueprint: Arc<Blueprint>,
    overrides: Arc<StepOverrides>,
    runner: ShellRunner,
    pause: Arc<PauseGate>,
    shutdown: Shutdown,
}

impl Orchestrator {
    pub fn new(
        project_root: PathBuf,
        adapter: Arc<dyn PlatformAdapter>,
        blueprint: Arc<Blueprint>,
        overrides: Arc<StepOverrides>,
        pause: Arc<PauseGate>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            adapter,
            blueprint,
            overrides,
            runner: ShellRunner::new(project_root),
            pause,
            shutdown,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Execute the Blueprint sequentially, job by job, step by step
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let mut executed_steps = Vec::new();
        let mut skipped_steps = Vec::new();
        let mut failed_step = None;
        let mut outcome = RunOutcome::Succeeded;

        info!(
            run = %self.run_id,
            platform = %self.blueprint.platform,
            jobs = self.blueprint.jobs.len(),
            "run started"
        );

        'run: for job in &self.blueprint.jobs {
            if self.shutdown.is_triggered() {
                outcome = RunOutcome::Cancelled;
                break 'run;
            }

            let context = ExecutionContext::from_environment(&job.environment);

            if !self
                .adapter
                .evaluate_condition(job.run_condition.as_deref(), &context)
            {
                info!(
                    run = %self.run_id,
                    job = %job.id,
                    "job '{}' skipped (condition false)",
                    job.display_name
                );
                skipped_steps.extend(job.steps.iter().map(|s| s.id.clone()));
                continue;
            }

            info!(run = %self.run_id, job = %job.id, "job '{}' started", job.display_name);

            for step in &job.steps {
                let action = self.overrides.action_for(&step.id);

                if action == StepAction::Skip {
                    info!(
                        run = %self.run_id,
                        step = %step.id,
                        "step '{}' skipped (override)",
                        step.display_name
                    );
                    skipped_steps.push(step.id.clone());
                    continue;
                }

                if !self
                    .adapter
                    .evaluate_condition(step.run_condition.as_deref(), &context)
                {
                    info!(
                        run = %self.run_id,
                        step = %step.id,
                        "step '{}' skipped (condition false)",
                        step.display_name
                    );
                    skipped_steps.push(step.id.clone());
                    continue;
                }

                info!(
                    run = %self.run_id,
                    step = %step.id,
                    "step '{}' started ({} command{})",
                    step.display_name,
                    step.task.command_count(),
                    if step.task.command_count() == 1 { "" } else { "s" }
                );

                match self
                    .runner
                    .run_task(step, &job.environment, &self.shutdown)
                    .await
                {
                    Ok(()) => {
                        info!(
                            run = %self.run_id,
                            step = %step.id,
                            "step '{}' succeeded",
                            step.display_name
                        );
                        executed_steps.push(step.id.clone());
                    }
                    Err(ExecutionError::Cancelled) => {
                        outcome = RunOutcome::Cancelled;
                        break 'run;
                    }
                    Err(e) => {
                        error!(
                            run = %self.run_id,
                            step = %step.id,
                            "step '{}' failed: {}",
                            step.display_name,
                            e
                        );
                        failed_step = Some(step.id.clone());
                        outcome = RunOutcome::Failed;
                        break 'run;
                    }
                }

                if action == StepAction::PauseAfter {
                    info!(
                        run = %self.run_id,
                        step = %step.id,
                        "paused after step '{}', awaiting continue signal",
                        step.display_name
                    );
                    match self.pause.wait(self.run_id, &self.shutdown).await {
                        PauseOutcome::Resumed => {
                            info!(run = %self.run_id, step = %step.id, "resumed");
                        }
                        PauseOutcome::Cancelled => {
                            outcome = RunOutcome::Cancelled;
                            break 'run;
                        }
                    }
                }
            }
        }

        match outcome {
            RunOutcome::Succeeded => info!(run = %self.run_id, "run SUCCEEDED"),
            RunOutcome::Failed => error!(run = %self.run_id, "run FAILED"),
            RunOutcome::Cancelled => warn!(run = %self.run_id, "run CANCELLED"),
        }

        RunReport {
            run_id: self.run_id,
            outcome,
            started_at,
            finished_at: Utc::now(),
            executed_steps,
            skipped_steps,
            failed_step,
        }
    }
}
