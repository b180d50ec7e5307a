//! Scenario engine
//!
//! Declarations are loaded from scenario files into a collection, resolved
//! into concrete scenarios, grouped by build command, and run with
//! fail-fast semantics.

pub mod collection;
pub mod definition;
pub mod engine;
pub mod file;
pub mod report;
pub mod resolved;
pub mod runners;

pub use collection::ScenarioCollectionBuilder;
pub use definition::{
    ExternalReference, RunnerKind, ScenarioDefinition, TestCaseDefinition, TestCaseEntry,
};
pub use engine::{group_by_build, BuildExecutor, BuildGroup, Engine, RunOutcome};
pub use file::{load_scenarios, make_kernel};
pub use resolved::{Scenario, TestCase};
pub use runners::{CommandRunner, DirectRunner, InteractiveRunner, RunContext, RunnerSettings};
