//! Scenario registry and reference resolution
//!
//! One collection holds the declarations of one scenario file. Building it
//! resolves every external reference into concrete test cases and drops the
//! templates.

use std::collections::HashMap;

use super::definition::{ScenarioDefinition, TestCaseEntry};
use super::resolved::{Scenario, TestCase};
use super::runners::{bind_runner, RunnerSettings};
use crate::common::{Error, Result};

/// Named registry of scenario declarations
#[derive(Debug, Default)]
pub struct ScenarioCollectionBuilder {
    definitions: Vec<ScenarioDefinition>,
    index: HashMap<String, usize>,
}

impl ScenarioCollectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration under its name
    ///
    /// Re-registering a name replaces the earlier declaration in place.
    pub fn register(&mut self, definition: ScenarioDefinition) -> &mut Self {
        match self.index.get(&definition.name) {
            Some(&slot) => {
                tracing::debug!(scenario = %definition.name, "replacing scenario declaration");
                self.definitions[slot] = definition;
            }
            None => {
                self.index
                    .insert(definition.name.clone(), self.definitions.len());
                self.definitions.push(definition);
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioDefinition> {
        self.index.get(name).map(|&slot| &self.definitions[slot])
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Resolve every concrete scenario, in registration order
    pub fn build(self, settings: &RunnerSettings) -> Result<Vec<Scenario>> {
        let mut scenarios = Vec::new();
        for definition in &self.definitions {
            if definition.is_template() {
                tracing::debug!(scenario = %definition.name, "skipping template");
                continue;
            }
            scenarios.push(self.resolve_definition(definition, settings)?);
        }
        Ok(scenarios)
    }

    /// Resolve a single registered scenario by name
    pub fn resolve(&self, name: &str, settings: &RunnerSettings) -> Result<Scenario> {
        let definition = self
            .get(name)
            .ok_or_else(|| Error::unknown_scenario(name, "the command line"))?;
        self.resolve_definition(definition, settings)
    }

    fn resolve_definition(
        &self,
        definition: &ScenarioDefinition,
        settings: &RunnerSettings,
    ) -> Result<Scenario> {
        let command = definition
            .command
            .clone()
            .ok_or_else(|| Error::MissingCommand(definition.name.clone()))?;

        let mut path = vec![definition.name.clone()];
        let mut test_cases = Vec::new();
        self.resolve_entries(definition, None, &command, settings, &mut path, &mut test_cases)?;

        tracing::debug!(
            scenario = %definition.name,
            test_cases = test_cases.len(),
            "resolved scenario"
        );

        Ok(Scenario {
            name: definition.name.clone(),
            builds: definition.builds.clone().unwrap_or_default(),
            command,
            test_cases,
        })
    }

    /// Depth-first expansion of `definition`'s entries into `out`
    ///
    /// `path` holds the scenario names currently being expanded; meeting one
    /// of them again is a cycle.
    fn resolve_entries(
        &self,
        definition: &ScenarioDefinition,
        group: Option<&str>,
        command: &str,
        settings: &RunnerSettings,
        path: &mut Vec<String>,
        out: &mut Vec<TestCase>,
    ) -> Result<()> {
        for entry in &definition.test_cases {
            match entry {
                TestCaseEntry::Inline(test_case) => {
                    let name = match group {
                        Some(group) => format!("{} [{}]", test_case.name, group),
                        None => test_case.name.clone(),
                    };
                    out.push(TestCase::new(
                        name,
                        bind_runner(&test_case.runner, command, settings),
                    ));
                }
                TestCaseEntry::External(reference) => {
                    if path.iter().any(|seen| seen == &reference.target) {
                        return Err(Error::cycle_detected(path.as_slice(), &reference.target));
                    }

                    let target = self
                        .get(&reference.target)
                        .ok_or_else(|| Error::unknown_scenario(&reference.target, &definition.name))?;

                    path.push(reference.target.clone());
                    self.resolve_entries(target, Some(&target.name), command, settings, path, out)?;
                    path.pop();
                }
            }
        }
        Ok(())
    }
}
