//! ktest - build-grouped integration tests for kernels booted under emulators
//!
//! Scenarios declare build commands, an emulator command, and test cases.
//! Each distinct build runs once; every scenario depending on it is then
//! exercised, and the first failure ends the run.

pub mod cli;
pub mod commands;
pub mod common;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use scenario::{RunOutcome, Scenario, ScenarioCollectionBuilder, ScenarioDefinition};
