//! Resolved scenarios and test cases

use super::report;
use super::runners::{CommandRunner, RunContext};
use crate::common::Result;

/// A named check bound to one runner
pub struct TestCase {
    name: String,
    runner: Box<dyn CommandRunner>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            name: name.into(),
            runner,
        }
    }

    /// Display name; inlined test cases carry their group as `"<name> [<group>]"`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, ctx: &RunContext) -> Result<bool> {
        self.runner.run(ctx).await
    }

    pub fn explain(&self) -> String {
        self.runner.explain()
    }

    pub fn required_program(&self) -> Option<&str> {
        self.runner.required_program()
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("runner", &self.runner.explain())
            .finish()
    }
}

/// A fully resolved scenario, ready to run once one of its builds succeeded
#[derive(Debug)]
pub struct Scenario {
    pub name: String,
    pub builds: Vec<String>,
    pub command: String,
    pub test_cases: Vec<TestCase>,
}

impl Scenario {
    /// Run the test cases in order, reporting each one
    ///
    /// Stops at the first failing test case and returns its index;
    /// `None` means every test case passed.
    pub async fn run_until_failure(&self, ctx: &RunContext) -> Result<Option<usize>> {
        for (index, test) in self.test_cases.iter().enumerate() {
            report::test_started(&self.name, test.name());

            match test.run(ctx).await {
                Ok(true) => report::test_passed(&self.name, test.name()),
                Ok(false) => {
                    tracing::info!(scenario = %self.name, test_case = %test.name(), "test case failed");
                    report::test_failed(&self.name, test.name(), &test.explain());
                    return Ok(Some(index));
                }
                Err(e) => {
                    report::test_failed(&self.name, test.name(), &test.explain());
                    return Err(e);
                }
            }
        }

        Ok(None)
    }

    /// Run the test cases in order; `false` at the first failure
    pub async fn run(&self, ctx: &RunContext) -> Result<bool> {
        Ok(self.run_until_failure(ctx).await?.is_none())
    }
}
