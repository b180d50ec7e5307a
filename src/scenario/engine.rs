//! Build-grouped execution
//!
//! Scenarios sharing a build command are run after a single execution of
//! that build. The first failing build or test case ends the whole run.

use async_trait::async_trait;
use serde::Serialize;

use super::report;
use super::resolved::Scenario;
use super::runners::{echo_stdio, shell_command, RunContext};
use crate::common::{Error, Result};

/// Scenarios that run after one build command
///
/// The key is the literal build string: two commands that differ only in
/// whitespace or variable order are separate groups and are built twice.
#[derive(Debug)]
pub struct BuildGroup<'a> {
    pub build: &'a str,
    pub scenarios: Vec<&'a Scenario>,
}

/// Group scenarios by exact build command
///
/// Groups appear in the order their build was first seen; scenarios keep
/// their order within a group. A scenario with several builds appears in
/// several groups.
pub fn group_by_build(scenarios: &[Scenario]) -> Vec<BuildGroup<'_>> {
    let mut groups: Vec<BuildGroup<'_>> = Vec::new();

    for scenario in scenarios {
        for build in &scenario.builds {
            match groups.iter_mut().find(|group| group.build == build.as_str()) {
                Some(group) => group.scenarios.push(scenario),
                None => groups.push(BuildGroup {
                    build: build.as_str(),
                    scenarios: vec![scenario],
                }),
            }
        }
    }

    groups
}

/// Executes build commands
#[async_trait]
pub trait BuildExecutor: Send + Sync {
    /// Run `command`; `true` when it exited 0
    async fn execute(&self, command: &str, ctx: &RunContext) -> Result<bool>;
}

/// Runs builds through `sh -c`, stdout discarded unless echoing, stderr kept
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellBuildExecutor;

#[async_trait]
impl BuildExecutor for ShellBuildExecutor {
    async fn execute(&self, command: &str, ctx: &RunContext) -> Result<bool> {
        tracing::debug!(%command, "running build");

        let status = shell_command(command, ctx)
            .stdout(echo_stdio(ctx.echo))
            .stderr(std::process::Stdio::inherit())
            .status()
            .await
            .map_err(|e| Error::spawn("sh", e))?;

        tracing::debug!(code = ?status.code(), "build finished");
        Ok(status.success())
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Passed { builds: usize, test_cases: usize },
    BuildFailed { build: String },
    TestFailed { scenario: String, test_case: String },
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, RunOutcome::Passed { .. })
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Runs build groups strictly in sequence
pub struct Engine<E = ShellBuildExecutor> {
    executor: E,
    ctx: RunContext,
}

impl Engine<ShellBuildExecutor> {
    pub fn new(ctx: RunContext) -> Self {
        Self::with_executor(ShellBuildExecutor, ctx)
    }
}

impl<E: BuildExecutor> Engine<E> {
    pub fn with_executor(executor: E, ctx: RunContext) -> Self {
        Self { executor, ctx }
    }

    /// Build each group once and run its scenarios, stopping at the first failure
    pub async fn run(&self, groups: &[BuildGroup<'_>]) -> Result<RunOutcome> {
        let mut test_cases = 0;

        for group in groups {
            tracing::info!(build = %group.build, scenarios = group.scenarios.len(), "starting build group");
            report::build_started(group.build);

            let built = match self.executor.execute(group.build, &self.ctx).await {
                Ok(built) => built,
                Err(e) => {
                    report::build_failed(group.build);
                    return Err(e);
                }
            };
            if !built {
                report::build_failed(group.build);
                return Ok(RunOutcome::BuildFailed {
                    build: group.build.to_string(),
                });
            }
            report::build_passed();

            for scenario in &group.scenarios {
                if let Some(index) = scenario.run_until_failure(&self.ctx).await? {
                    return Ok(RunOutcome::TestFailed {
                        scenario: scenario.name.clone(),
                        test_case: scenario.test_cases[index].name().to_string(),
                    });
                }
                test_cases += scenario.test_cases.len();
            }

            report::group_passed();
        }

        report::run_passed(groups.len(), test_cases);
        Ok(RunOutcome::Passed {
            builds: groups.len(),
            test_cases,
        })
    }
}
