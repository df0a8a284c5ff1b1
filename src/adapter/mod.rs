//! Platform adapters - translators between native CI formats and the Blueprint

pub mod actions;
pub mod jenkins;

use crate::blueprint::{Blueprint, BlueprintError, ExecutionContext};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub use actions::WorkflowAdapter;
pub use jenkins::{JenkinsAdapter, LinterModelExtractor, ModelExtractor};

/// Errors from detecting or parsing a native pipeline definition
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no pipeline file found under {0}")]
    MissingPipelineFile(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("linter '{command}' exited with code {code}: {stderr}")]
    Linter {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to launch linter '{command}': {source}")]
    LinterSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("linter output is not valid JSON: {0}")]
    LinterOutput(#[from] serde_json::Error),

    #[error("malformed workflow file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("malformed pipeline model: {0}")]
    Malformed(String),

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
}

/// Capability set implemented once per native CI system
///
/// The engine is generic over this trait and never special-cases a platform
/// by name outside the adapter boundary.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Platform tag, used for `Blueprint.platform` and log lines
    fn name(&self) -> &'static str;

    /// Cheap, side-effect-free detection; "not applicable" is `false`, never
    /// an error
    fn can_handle(&self, project_root: &Path) -> bool;

    /// The single authoritative native pipeline file for this project
    ///
    /// The engine derives the override-config path from it and treats edits
    /// to it as a refresh rather than a run trigger.
    fn pipeline_file(&self, project_root: &Path) -> Option<PathBuf>;

    /// Parse the native definition into a Blueprint
    ///
    /// Fails whole: either a fully consistent Blueprint or an error, never a
    /// partial result.
    async fn parse(&self, project_root: &Path) -> Result<Blueprint, AdapterError>;

    /// Evaluate a native condition string against the run context
    ///
    /// An absent condition is always true. Syntax the adapter cannot yet
    /// interpret fails open: log a warning and return true rather than
    /// silently skipping work.
    fn evaluate_condition(&self, condition: Option<&str>, context: &ExecutionContext) -> bool;
}

/// The built-in adapters, in probing order
///
/// Order is fixed so selection is deterministic across runs.
pub fn builtin_adapters() -> Vec<Arc<dyn PlatformAdapter>> {
    vec![
        Arc::new(JenkinsAdapter::default()),
        Arc::new(WorkflowAdapter::new()),
    ]
}

/// Probe adapters in order and return the first that claims the project
pub fn select_adapter(
    adapters: &[Arc<dyn PlatformAdapter>],
    project_root: &Path,
) -> Option<Arc<dyn PlatformAdapter>> {
    adapters
        .iter()
        .find(|adapter| adapter.can_handle(project_root))
        .cloned()
}
