//! Scenario-based tests for pitstop

mod conditions;
mod engine_loop;
mod fail_fast;
mod overrides;
