//! Step override config - per-step developer actions keyed by step id

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while loading the override config file
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed override config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// What to do with a step, overriding its default behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Execute normally (the default for steps with no entry)
    #[default]
    Run,
    /// Do not execute; the step's condition is never evaluated
    Skip,
    /// Execute, then pause the run until an external continue signal
    PauseAfter,
}

/// Entry shape in the override config file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OverrideEntry {
    action: StepAction,
}

/// Resolved per-step actions for one pipeline
///
/// Loaded from a file colocated with the pipeline definition: the pipeline
/// file's extension replaced with `steps.yaml` (`ci.yml` -> `ci.steps.yaml`,
/// `Jenkinsfile` -> `Jenkinsfile.steps.yaml`). A missing file means no
/// overrides; every step runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOverrides {
    actions: HashMap<String, StepAction>,
}

impl StepOverrides {
    /// Empty overrides: every step action resolves to `Run`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from an explicit map (used by tests and embedders)
    pub fn from_map(actions: HashMap<String, StepAction>) -> Self {
        Self { actions }
    }

    /// The override file path for a given pipeline file
    pub fn path_for(pipeline_file: &Path) -> PathBuf {
        pipeline_file.with_extension("steps.yaml")
    }

    /// Load overrides for a pipeline file, treating absence as empty
    pub fn load_for(pipeline_file: &Path) -> Result<Self, OverrideError> {
        let path = Self::path_for(pipeline_file);
        if !path.is_file() {
            return Ok(Self::empty());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| OverrideError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| OverrideError::Malformed { path, source })
    }

    /// Parse overrides from a YAML mapping of step id to `{action}`
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let entries: HashMap<String, OverrideEntry> = serde_yaml::from_str(yaml)?;
        Ok(Self {
            actions: entries
                .into_iter()
                .map(|(id, entry)| (id, entry.action))
                .collect(),
        })
    }

    /// Resolve the action for a step; absence means `Run`
    pub fn action_for(&self, step_id: &str) -> StepAction {
        self.actions.get(step_id).copied().unwrap_or_default()
    }

    /// Number of explicit entries
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether any explicit entries exist
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
