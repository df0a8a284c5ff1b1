//! pitstop - run native CI/CD pipelines locally

pub mod adapter;
pub mod blueprint;
pub mod cli;
pub mod engine;
pub mod execution;

// Re-export commonly used types
pub use adapter::{builtin_adapters, select_adapter, AdapterError, PlatformAdapter};
pub use blueprint::{Blueprint, ExecutionContext, Job, Step, StepAction, StepOverrides, TaskDefinition};
pub use engine::{CoreEngine, EngineError, EngineState, Shutdown, ShutdownHandle, Signal, Snapshot};
pub use execution::{Orchestrator, PauseGate, RunOutcome, RunReport};
