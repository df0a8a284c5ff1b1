//! Execution context - variables visible to condition evaluation

use std::collections::HashMap;

/// Variable scope for one orchestrator run
///
/// Built from a job's declared environment before its steps execute and
/// handed to the adapter read-only for native condition evaluation.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Flat variable map; later insertions win
    pub variables: HashMap<String, String>,
}

impl ExecutionContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from ordered environment pairs
    ///
    /// Declared order matters: a later duplicate key overrides an earlier one,
    /// matching how the native systems layer their environments.
    pub fn from_environment(environment: &[(String, String)]) -> Self {
        let mut context = Self::new();
        for (key, value) in environment {
            context.variables.insert(key.clone(), value.clone());
        }
        context
    }

    /// Get a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Set a variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }
}
