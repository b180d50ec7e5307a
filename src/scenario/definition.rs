//! Scenario declarations
//!
//! Typed records for scenarios as they are declared, before any reference
//! is resolved. Declarations are built either with the chained builder
//! methods below or by loading a scenario file (see [`super::file`]).

/// How a declared test case exercises the scenario's command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerKind {
    /// Drive the command through an expect script; the script decides the verdict
    Interactive { script: String },
    /// Run the command and require exit status 0
    Direct,
}

/// A test case declared inline in a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseDefinition {
    pub name: String,
    pub runner: RunnerKind,
}

impl TestCaseDefinition {
    /// Test case that succeeds when `script` exits 0 while driving the command
    pub fn expects(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runner: RunnerKind::Interactive {
                script: script.into(),
            },
        }
    }

    /// Test case that succeeds when the command exits 0
    pub fn executes(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runner: RunnerKind::Direct,
        }
    }
}

/// Pulls in every test case of another scenario at this position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalReference {
    pub target: String,
}

/// One entry of a scenario's test case list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCaseEntry {
    Inline(TestCaseDefinition),
    External(ExternalReference),
}

/// A named scenario as declared
///
/// Without builds or without a command the scenario is a template: it is
/// never run itself and only contributes test cases to scenarios that
/// reference it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDefinition {
    pub name: String,
    pub builds: Option<Vec<String>>,
    pub command: Option<String>,
    pub test_cases: Vec<TestCaseEntry>,
}

impl ScenarioDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builds: None,
            command: None,
            test_cases: Vec::new(),
        }
    }

    /// Set the build commands this scenario runs after
    pub fn builds<I, S>(mut self, builds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builds = Some(builds.into_iter().map(Into::into).collect());
        self
    }

    /// Set the command every test case of this scenario runs
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Append an inline test case
    pub fn it(mut self, test_case: TestCaseDefinition) -> Self {
        self.test_cases.push(TestCaseEntry::Inline(test_case));
        self
    }

    /// Append a reference to all test cases of `target`
    pub fn it_successfully_runs(mut self, target: impl Into<String>) -> Self {
        self.test_cases
            .push(TestCaseEntry::External(ExternalReference {
                target: target.into(),
            }));
        self
    }

    pub fn is_template(&self) -> bool {
        self.builds.is_none() || self.command.is_none()
    }
}
