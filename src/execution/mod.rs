//! Run execution - the per-run interpreter and its task runners

pub mod orchestrator;
pub mod pause;
pub mod shell;

pub use orchestrator::{Orchestrator, RunOutcome, RunReport};
pub use pause::{PauseGate, PauseOutcome};
pub use shell::{ExecutionError, ShellRunner};
