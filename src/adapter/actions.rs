//! Workflow-YAML adapter - multi-job graph pipelines

use crate::adapter::{AdapterError, PlatformAdapter};
use crate::blueprint::{slugify, Blueprint, ExecutionContext, Job, Step, TaskDefinition};
use async_trait::async_trait;
use regex::Regex;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

/// Directories probed for workflow files, in order
const WORKFLOW_DIRS: &[&str] = &[".github/workflows", "workflows"];

/// Adapter for YAML workflow graphs (one native job per Blueprint job)
///
/// The authoritative file is the lexicographically first `.yml`/`.yaml` file
/// in the first workflow directory that exists, so detection and selection
/// are deterministic.
#[derive(Debug, Default)]
pub struct WorkflowAdapter;

impl WorkflowAdapter {
    pub fn new() -> Self {
        Self
    }

    fn find_workflow_file(project_root: &Path) -> Option<PathBuf> {
        for dir in WORKFLOW_DIRS {
            let dir = project_root.join(dir);
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };

            let mut candidates: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && matches!(
                            p.extension().and_then(|e| e.to_str()),
                            Some("yml") | Some("yaml")
                        )
                })
                .collect();
            candidates.sort();

            if let Some(first) = candidates.into_iter().next() {
                return Some(first);
            }
        }
        None
    }

    /// Transform one native job mapping into a Blueprint Job
    fn transform_job(job_key: &str, native: &Value) -> Result<Job, AdapterError> {
        let display_name = native
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(job_key)
            .to_string();

        let run_condition = native
            .get("if")
            .and_then(Value::as_str)
            .map(str::to_string);

        // Mapping iteration preserves document order, which is the declared
        // environment order.
        let mut environment = Vec::new();
        if let Some(env) = native.get("env").and_then(Value::as_mapping) {
            for (key, value) in env {
                let key = key.as_str().ok_or_else(|| {
                    AdapterError::Malformed(format!("job '{}' has a non-string env key", job_key))
                })?;
                environment.push((key.to_string(), yaml_scalar_to_string(value)));
            }
        }

        let native_steps = native
            .get("steps")
            .and_then(Value::as_sequence)
            .ok_or_else(|| {
                AdapterError::Malformed(format!("job '{}' has no steps list", job_key))
            })?;

        let mut steps = Vec::with_capacity(native_steps.len());
        for (index, native_step) in native_steps.iter().enumerate() {
            steps.push(Self::transform_step(job_key, native_step, index)?);
        }

        Ok(Job {
            id: job_key.to_string(),
            display_name,
            run_condition,
            environment,
            steps,
        })
    }

    fn transform_step(
        job_key: &str,
        native: &Value,
        index: usize,
    ) -> Result<Step, AdapterError> {
        if native.get("uses").is_some() {
            // Only shell tasks execute locally; dropping the step silently
            // would yield a partial Blueprint.
            return Err(AdapterError::Malformed(format!(
                "job '{}' step {} uses a remote action, which cannot run locally",
                job_key,
                index + 1
            )));
        }

        let run = native.get("run").and_then(Value::as_str).ok_or_else(|| {
            AdapterError::Malformed(format!(
                "job '{}' step {} has no run script",
                job_key,
                index + 1
            ))
        })?;

        let display_name = native
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                run.lines().next().unwrap_or("run").trim().to_string()
            });

        let slug = match native.get("name").and_then(Value::as_str) {
            Some(name) => slugify(name, index),
            None => format!("step-{}", index + 1),
        };

        let working_directory = native
            .get("working-directory")
            .and_then(Value::as_str)
            .map(PathBuf::from);

        Ok(Step {
            id: format!("{}.{}", job_key, slug),
            display_name,
            run_condition: native
                .get("if")
                .and_then(Value::as_str)
                .map(str::to_string),
            working_directory,
            task: TaskDefinition::Shell {
                // A run block is one shell script and runs as one subprocess.
                commands: vec![run.to_string()],
            },
        })
    }
}

fn yaml_scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn condition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^env\.([A-Za-z_][A-Za-z0-9_]*)\s*(==|!=)\s*'([^']*)'$")
            .expect("static condition pattern")
    })
}

#[async_trait]
impl PlatformAdapter for WorkflowAdapter {
    fn name(&self) -> &'static str {
        "workflow"
    }

    fn can_handle(&self, project_root: &Path) -> bool {
        Self::find_workflow_file(project_root).is_some()
    }

    fn pipeline_file(&self, project_root: &Path) -> Option<PathBuf> {
        Self::find_workflow_file(project_root)
    }

    async fn parse(&self, project_root: &Path) -> Result<Blueprint, AdapterError> {
        let path = Self::find_workflow_file(project_root)
            .ok_or_else(|| AdapterError::MissingPipelineFile(project_root.to_path_buf()))?;

        let content = std::fs::read_to_string(&path).map_err(|source| AdapterError::Io {
            path: path.clone(),
            source,
        })?;
        let document: Value =
            serde_yaml::from_str(&content).map_err(|source| AdapterError::Yaml {
                path: path.clone(),
                source,
            })?;

        let native_jobs = document
            .get("jobs")
            .and_then(Value::as_mapping)
            .ok_or_else(|| {
                AdapterError::Malformed(format!("{} has no jobs mapping", path.display()))
            })?;

        // Mapping order is document order; declared job order is preserved.
        let mut jobs = Vec::with_capacity(native_jobs.len());
        for (key, native) in native_jobs {
            let job_key = key.as_str().ok_or_else(|| {
                AdapterError::Malformed("non-string job key in workflow".to_string())
            })?;
            jobs.push(Self::transform_job(job_key, native)?);
        }

        Ok(Blueprint::new("1".to_string(), self.name().to_string(), jobs)?)
    }

    fn evaluate_condition(&self, condition: Option<&str>, context: &ExecutionContext) -> bool {
        let Some(raw) = condition else {
            return true;
        };

        // Expression wrappers are optional in the native syntax.
        let expr = raw
            .trim()
            .strip_prefix("${{")
            .and_then(|s| s.strip_suffix("}}"))
            .unwrap_or(raw.trim())
            .trim();

        match expr {
            "always()" | "true" => return true,
            "false" => return false,
            _ => {}
        }

        if let Some(caps) = condition_pattern().captures(expr) {
            let actual = context.get(&caps[1]).unwrap_or_default();
            let equals = actual == &caps[3];
            return if &caps[2] == "==" { equals } else { !equals };
        }

        warn!("cannot interpret if-condition '{}', running step anyway", raw);
        true
    }
}
