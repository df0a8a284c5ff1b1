//! Jenkins declarative adapter - linter-backed model extraction

use crate::adapter::{AdapterError, PlatformAdapter};
use crate::blueprint::{slugify, Blueprint, ExecutionContext, Job, Step, TaskDefinition};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::{debug, warn};

const PIPELINE_FILE: &str = "Jenkinsfile";
const DEFAULT_LINTER: &str = "jflint";
const LINTER_ENV: &str = "PITSTOP_JENKINS_LINTER";

/// Extracts the declarative pipeline model from a Jenkinsfile
///
/// The real implementation shells out to an external linter; tests inject a
/// canned extractor so no subprocess is involved.
#[async_trait]
pub trait ModelExtractor: Send + Sync {
    /// Produce the model JSON document for the given pipeline file
    async fn extract(&self, pipeline_file: &Path) -> Result<String, AdapterError>;
}

/// Shells out to the model-extraction linter
///
/// Contract: the tool is invoked with the Jenkinsfile path as its only
/// argument, prints a JSON model on stdout on success, and exits non-zero
/// with diagnostics on stderr on failure.
#[derive(Debug, Clone)]
pub struct LinterModelExtractor {
    command: String,
}

impl LinterModelExtractor {
    pub fn new(command: String) -> Self {
        Self { command }
    }

    /// Linter command from `PITSTOP_JENKINS_LINTER`, defaulting to `jflint`
    pub fn from_env() -> Self {
        let command =
            std::env::var(LINTER_ENV).unwrap_or_else(|_| DEFAULT_LINTER.to_string());
        Self::new(command)
    }
}

#[async_trait]
impl ModelExtractor for LinterModelExtractor {
    async fn extract(&self, pipeline_file: &Path) -> Result<String, AdapterError> {
        debug!("invoking {} on {}", self.command, pipeline_file.display());

        let output = Command::new(&self.command)
            .arg(pipeline_file)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| AdapterError::LinterSpawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            warn!("{} exited with code {}: {}", self.command, code, stderr);
            return Err(AdapterError::Linter {
                command: self.command.clone(),
                code,
                stderr,
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|e| AdapterError::Malformed(format!("linter output is not UTF-8: {}", e)))
    }
}

// Native-shaped model deserialized from the linter's JSON document.

#[derive(Debug, Deserialize)]
struct LinterModel {
    pipeline: NativePipeline,
}

#[derive(Debug, Deserialize)]
struct NativePipeline {
    #[serde(default)]
    environment: Vec<NativeEnvEntry>,
    stages: Vec<NativeStage>,
}

#[derive(Debug, Deserialize)]
struct NativeEnvEntry {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct NativeStage {
    name: String,
    #[serde(default)]
    when: Option<String>,
    branches: Vec<NativeBranch>,
}

#[derive(Debug, Deserialize)]
struct NativeBranch {
    #[serde(default)]
    steps: Vec<NativeStep>,
}

#[derive(Debug, Deserialize)]
struct NativeStep {
    name: String,
    #[serde(default)]
    arguments: Vec<NativeArgument>,
    #[serde(default)]
    children: Vec<NativeStep>,
}

#[derive(Debug, Deserialize)]
struct NativeArgument {
    key: String,
    value: serde_json::Value,
}

impl NativeStep {
    fn argument(&self, key: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.key == key)
            .and_then(|a| a.value.as_str())
    }
}

/// Adapter for Jenkins declarative pipelines
pub struct JenkinsAdapter {
    extractor: Box<dyn ModelExtractor>,
}

impl Default for JenkinsAdapter {
    fn default() -> Self {
        Self::new(Box::new(LinterModelExtractor::from_env()))
    }
}

impl JenkinsAdapter {
    /// Create an adapter with an injected model extractor
    pub fn new(extractor: Box<dyn ModelExtractor>) -> Self {
        Self { extractor }
    }

    /// Collapse one native stage into exactly one Step
    ///
    /// The step's task is the ordered concatenation of the stage's shell
    /// fragments; a `dir` wrapper contributes its children's fragments and
    /// sets the working directory.
    fn transform_stage(stage: &NativeStage, index: usize) -> Result<Step, AdapterError> {
        let mut commands = Vec::new();
        let mut working_directory = None;

        for branch in &stage.branches {
            for native in &branch.steps {
                Self::collect_shell(native, &mut commands, &mut working_directory)?;
            }
        }

        if commands.is_empty() {
            return Err(AdapterError::Malformed(format!(
                "stage '{}' contains no shell steps",
                stage.name
            )));
        }

        Ok(Step {
            id: format!("pipeline.{}", slugify(&stage.name, index)),
            display_name: stage.name.clone(),
            run_condition: stage.when.clone(),
            working_directory,
            task: TaskDefinition::Shell { commands },
        })
    }

    fn collect_shell(
        native: &NativeStep,
        commands: &mut Vec<String>,
        working_directory: &mut Option<PathBuf>,
    ) -> Result<(), AdapterError> {
        match native.name.as_str() {
            "sh" => {
                let script = native
                    .argument("script")
                    .or_else(|| native.arguments.first().and_then(|a| a.value.as_str()))
                    .ok_or_else(|| {
                        AdapterError::Malformed("sh step without a script argument".to_string())
                    })?;
                commands.push(script.to_string());
            }
            "dir" => {
                if let Some(path) = native.argument("path") {
                    *working_directory = Some(PathBuf::from(path));
                }
                for child in &native.children {
                    Self::collect_shell(child, commands, working_directory)?;
                }
            }
            other => {
                // Non-shell stage steps (echo, archiveArtifacts, ...) have no
                // local execution counterpart.
                debug!("ignoring non-shell step '{}'", other);
            }
        }
        Ok(())
    }
}

fn condition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*env\.([A-Za-z_][A-Za-z0-9_]*)\s*(==|!=)\s*'([^']*)'\s*$")
            .expect("static condition pattern")
    })
}

#[async_trait]
impl PlatformAdapter for JenkinsAdapter {
    fn name(&self) -> &'static str {
        "jenkins"
    }

    fn can_handle(&self, project_root: &Path) -> bool {
        project_root.join(PIPELINE_FILE).is_file()
    }

    fn pipeline_file(&self, project_root: &Path) -> Option<PathBuf> {
        let path = project_root.join(PIPELINE_FILE);
        path.is_file().then_some(path)
    }

    async fn parse(&self, project_root: &Path) -> Result<Blueprint, AdapterError> {
        let pipeline_file = self
            .pipeline_file(project_root)
            .ok_or_else(|| AdapterError::MissingPipelineFile(project_root.to_path_buf()))?;

        let json = self.extractor.extract(&pipeline_file).await?;
        let model: LinterModel = serde_json::from_str(&json)?;

        let environment = model
            .pipeline
            .environment
            .iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect();

        let steps = model
            .pipeline
            .stages
            .iter()
            .enumerate()
            .map(|(index, stage)| Self::transform_stage(stage, index))
            .collect::<Result<Vec<_>, _>>()?;

        // Single top-level pipeline: exactly one Job in this mapping style.
        let job = Job {
            id: "pipeline".to_string(),
            display_name: "Declarative Pipeline".to_string(),
            run_condition: None,
            environment,
            steps,
        };

        Ok(Blueprint::new("1".to_string(), self.name().to_string(), vec![job])?)
    }

    fn evaluate_condition(&self, condition: Option<&str>, context: &ExecutionContext) -> bool {
        let Some(condition) = condition else {
            return true;
        };

        if let Some(caps) = condition_pattern().captures(condition) {
            let actual = context.get(&caps[1]).unwrap_or_default();
            let equals = actual == &caps[3];
            return if &caps[2] == "==" { equals } else { !equals };
        }

        warn!(
            "cannot interpret when-condition '{}', running step anyway",
            condition
        );
        true
    }
}
