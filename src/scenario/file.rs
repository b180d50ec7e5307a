//! Scenario files
//!
//! Scenario files are YAML documents. Script texts and build lists can be
//! declared once under a name and referenced from any scenario of the same
//! file:
//!
//! ```yaml
//! scripts:
//!   STARTUP: |
//!     expect "WELCOME TO SHELL"
//! builds:
//!   KERNEL:
//!     - OPT_FLAGS=-O0 make clean all image
//!     - make_kernel: { OPT_FLAGS: "-O3" }
//! scenarios:
//!   - name: shell
//!     test_cases:
//!       - name: starts the shell
//!         expect_ref: STARTUP
//!   - name: qemu shell
//!     builds_ref: KERNEL
//!     command: qemu-system-i386 -cdrom peos2.img -nographic
//!     test_cases:
//!       - include: shell
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::collection::ScenarioCollectionBuilder;
use super::definition::{ScenarioDefinition, TestCaseDefinition};
use super::resolved::Scenario;
use super::runners::RunnerSettings;
use crate::common::{Error, Result};

/// Variables every `make_kernel` build starts from
const MAKE_KERNEL_DEFAULTS: &[(&str, &str)] =
    &[("GRUB_CFG", "grub-shell.cfg"), ("DEFS", "-DNODEBUG")];

/// Command run by every `make_kernel` build after the variables
const MAKE_KERNEL_COMMAND: &str = "build/setenv target make clean all image";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    builds: BTreeMap<String, Vec<BuildEntry>>,
    #[serde(default)]
    scenarios: Vec<ScenarioEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum BuildEntry {
    Literal(String),
    MakeKernel { make_kernel: serde_yaml::Mapping },
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ScenarioEntry {
    name: String,
    builds: Option<Vec<BuildEntry>>,
    builds_ref: Option<String>,
    command: Option<String>,
    #[serde(default)]
    test_cases: Vec<TestCaseDoc>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TestCaseDoc {
    Include(IncludeDoc),
    Case(CaseDoc),
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct IncludeDoc {
    include: String,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct CaseDoc {
    name: String,
    expect: Option<String>,
    expect_ref: Option<String>,
    #[serde(default)]
    execute: bool,
}

/// Render a kernel build command from environment overrides
///
/// Overrides replace defaults in place; new variables are appended in the
/// order given. The result is used verbatim as a build group key.
pub fn make_kernel(overrides: &[(String, String)]) -> String {
    let mut env: Vec<(String, String)> = MAKE_KERNEL_DEFAULTS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    for (key, value) in overrides {
        match env.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.clone(),
            None => env.push((key.clone(), value.clone())),
        }
    }

    let joined: Vec<String> = env
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect();
    format!("{} {}", joined.join(" "), MAKE_KERNEL_COMMAND)
}

/// Parse a scenario file into a collection of declarations
pub fn parse_collection(content: &str, path: &Path) -> Result<ScenarioCollectionBuilder> {
    let file: ScenarioFile =
        serde_yaml::from_str(content).map_err(|e| Error::scenario_file(path, e.to_string()))?;

    let mut collection = ScenarioCollectionBuilder::new();
    for entry in &file.scenarios {
        collection.register(declare(entry, &file, path)?);
    }
    Ok(collection)
}

/// Load a scenario file and resolve its concrete scenarios
pub fn load_scenarios(path: &Path, settings: &RunnerSettings) -> Result<Vec<Scenario>> {
    tracing::debug!(path = %path.display(), "loading scenario file");
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    parse_collection(&content, path)?.build(settings)
}

fn declare(entry: &ScenarioEntry, file: &ScenarioFile, path: &Path) -> Result<ScenarioDefinition> {
    let mut definition = ScenarioDefinition::new(&entry.name);

    definition.builds = match (&entry.builds, &entry.builds_ref) {
        (Some(_), Some(_)) => {
            return Err(Error::scenario_file(
                path,
                format!("scenario '{}' sets both 'builds' and 'builds_ref'", entry.name),
            ))
        }
        (Some(builds), None) => Some(render_builds(builds, &entry.name, path)?),
        (None, Some(name)) => {
            let builds = file.builds.get(name).ok_or_else(|| Error::UnknownBuildList {
                name: name.clone(),
                scenario: entry.name.clone(),
            })?;
            Some(render_builds(builds, &entry.name, path)?)
        }
        (None, None) => None,
    };
    definition.command = entry.command.clone();

    for doc in &entry.test_cases {
        definition = match doc {
            TestCaseDoc::Include(doc) => definition.it_successfully_runs(&doc.include),
            TestCaseDoc::Case(case) => definition.it(test_case(case, &entry.name, file, path)?),
        };
    }

    Ok(definition)
}

fn test_case(
    case: &CaseDoc,
    scenario: &str,
    file: &ScenarioFile,
    path: &Path,
) -> Result<TestCaseDefinition> {
    match (&case.expect, &case.expect_ref, case.execute) {
        (Some(script), None, false) => Ok(TestCaseDefinition::expects(&case.name, script)),
        (None, Some(name), false) => {
            let script = file.scripts.get(name).ok_or_else(|| Error::UnknownScript {
                name: name.clone(),
                scenario: scenario.to_string(),
            })?;
            Ok(TestCaseDefinition::expects(&case.name, script))
        }
        (None, None, true) => Ok(TestCaseDefinition::executes(&case.name)),
        _ => Err(Error::scenario_file(
            path,
            format!(
                "test case '{}' in scenario '{}' needs exactly one of 'expect', 'expect_ref' or 'execute: true'",
                case.name, scenario
            ),
        )),
    }
}

fn render_builds(builds: &[BuildEntry], scenario: &str, path: &Path) -> Result<Vec<String>> {
    builds
        .iter()
        .map(|build| -> Result<String> {
            let env = match build {
                BuildEntry::Literal(command) => return Ok(command.clone()),
                BuildEntry::MakeKernel { make_kernel: env } => env,
            };

            let mut overrides = Vec::with_capacity(env.len());
            for (key, value) in env {
                let key = scalar(key).ok_or_else(|| {
                    Error::scenario_file(
                        path,
                        format!("make_kernel keys must be scalars in scenario '{}'", scenario),
                    )
                })?;
                let value = scalar(value).ok_or_else(|| {
                    Error::scenario_file(
                        path,
                        format!(
                            "make_kernel value for '{}' must be a scalar in scenario '{}'",
                            key, scenario
                        ),
                    )
                })?;
                overrides.push((key, value));
            }
            Ok(make_kernel(&overrides))
        })
        .collect()
}

fn scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
