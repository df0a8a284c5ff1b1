//! Canonical pipeline representation and its per-run companions

pub mod context;
pub mod model;
pub mod overrides;

pub use context::ExecutionContext;
pub use model::{slugify, Blueprint, BlueprintError, Job, Step, TaskDefinition};
pub use overrides::{OverrideError, StepAction, StepOverrides};
