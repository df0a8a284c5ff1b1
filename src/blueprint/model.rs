//! Blueprint domain model

use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced when assembling a Blueprint from native data
#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("duplicate step id: {0}")]
    DuplicateStepId(String),

    #[error("job '{0}' has no steps")]
    EmptyJob(String),
}

/// The canonical, platform-agnostic pipeline representation
///
/// Produced wholesale by a platform adapter on every (re)parse and never
/// mutated afterwards. Orchestrator runs hold a shared reference to exactly
/// one Blueprint for their whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blueprint {
    /// Format version of the native definition, if it declares one
    pub version: String,

    /// Which platform adapter produced this Blueprint
    pub platform: String,

    /// Jobs in declared order; declared order is execution order
    pub jobs: Vec<Job>,
}

/// A single job: an ordered group of steps with a shared environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    /// Stable identifier, unique within the Blueprint
    pub id: String,

    /// Human-readable name for logs
    pub display_name: String,

    /// Native-syntax condition string, opaque to the core
    pub run_condition: Option<String>,

    /// Environment variables in declared order
    pub environment: Vec<(String, String)>,

    /// Steps in declared order
    pub steps: Vec<Step>,
}

/// A single step within a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Stable identifier, unique within the Blueprint
    ///
    /// Derived from source coordinates (job key + stage/step name slug) so
    /// that override entries keyed by id keep applying after file edits that
    /// don't change step structure.
    pub id: String,

    /// Human-readable name for logs
    pub display_name: String,

    /// Native-syntax condition string, opaque to the core
    pub run_condition: Option<String>,

    /// Working directory relative to the project root
    pub working_directory: Option<PathBuf>,

    /// What the step actually runs
    pub task: TaskDefinition,
}

/// The executable payload of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaskDefinition {
    /// Shell commands executed as separate subprocesses, in order
    Shell { commands: Vec<String> },
}

impl TaskDefinition {
    /// Number of commands this task will run
    pub fn command_count(&self) -> usize {
        match self {
            TaskDefinition::Shell { commands } => commands.len(),
        }
    }
}

impl Blueprint {
    /// Assemble a Blueprint, enforcing its structural invariants
    ///
    /// A Blueprint is never partially valid: this either yields a consistent
    /// value or fails, so adapters cannot hand out half-parsed pipelines.
    pub fn new(
        version: String,
        platform: String,
        jobs: Vec<Job>,
    ) -> Result<Self, BlueprintError> {
        let mut seen = HashSet::new();
        for job in &jobs {
            if job.steps.is_empty() {
                return Err(BlueprintError::EmptyJob(job.id.clone()));
            }
            for step in &job.steps {
                if !seen.insert(step.id.clone()) {
                    return Err(BlueprintError::DuplicateStepId(step.id.clone()));
                }
            }
        }

        Ok(Blueprint {
            version,
            platform,
            jobs,
        })
    }

    /// Total number of steps across all jobs
    pub fn step_count(&self) -> usize {
        self.jobs.iter().map(|j| j.steps.len()).sum()
    }

    /// Look up a step by id
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.jobs
            .iter()
            .flat_map(|j| j.steps.iter())
            .find(|s| s.id == id)
    }
}

/// Turn a display name into a stable id fragment
///
/// Lowercases, maps runs of non-alphanumeric characters to single dashes and
/// trims them from the ends. Falls back to the given index for names that
/// slug to nothing.
pub fn slugify(name: &str, fallback_index: usize) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        format!("step-{}", fallback_index + 1)
    } else {
        slug
    }
}
