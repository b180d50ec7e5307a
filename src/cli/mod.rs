//! CLI command handling
//!
//! Loads scenarios for the selected repository and runs, lists, or explains
//! them. Every command returns the process exit code.

mod workspace;

use colored::Colorize;
use serde::Serialize;

use crate::commands::Commands;
use crate::common::{Error, Result};
use crate::scenario::{group_by_build, BuildGroup, Engine, RunContext, RunnerSettings};

pub use workspace::{ensure_programs_available, Workspace};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            source,
            verbose,
            only,
        } => {
            let workspace = Workspace::open(&source)?;
            let settings = RunnerSettings::from(&workspace.config);
            let echo = verbose || workspace.config.echo_output();

            let mut scenarios = workspace.load_scenarios(&settings)?;
            if !only.is_empty() {
                if let Some(missing) = only.iter().find(|name| !scenarios.iter().any(|s| &s.name == *name)) {
                    return Err(Error::unknown_scenario(missing, "--only"));
                }
                scenarios.retain(|s| only.contains(&s.name));
            }

            ensure_programs_available(&scenarios)?;

            let groups = group_by_build(&scenarios);
            if groups.is_empty() {
                println!("No scenarios to run");
                return Ok(0);
            }

            let engine = Engine::new(RunContext::new(&workspace.root, echo));
            let outcome = engine.run(&groups).await?;
            tracing::info!(?outcome, "run finished");

            Ok(outcome.exit_code())
        }

        Commands::List { source, json } => {
            let workspace = Workspace::open(&source)?;
            let settings = RunnerSettings::from(&workspace.config);
            let scenarios = workspace.load_scenarios(&settings)?;
            let groups = group_by_build(&scenarios);

            if json {
                let listing: Vec<GroupListing<'_>> = groups.iter().map(GroupListing::from).collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else if groups.is_empty() {
                println!("No scenarios found");
            } else {
                print_groups(&groups);
            }

            Ok(0)
        }

        Commands::Explain { scenario, source } => {
            let workspace = Workspace::open(&source)?;
            let settings = RunnerSettings::from(&workspace.config);
            let scenarios = workspace.load_scenarios(&settings)?;

            let found = scenarios
                .iter()
                .find(|s| s.name == scenario)
                .ok_or_else(|| Error::unknown_scenario(&scenario, "the command line"))?;

            println!("{} {}", "Scenario:".blue().bold(), found.name.white().bold());
            println!("  {} {}", "Command:".cyan(), found.command);
            for build in &found.builds {
                println!("  {} {}", "Build:".cyan(), build);
            }
            for test in &found.test_cases {
                println!("\n{} {}", "Test case:".cyan(), test.name());
                println!("{}", test.explain());
            }

            Ok(0)
        }
    }
}

fn print_groups(groups: &[BuildGroup<'_>]) {
    for group in groups {
        println!("{} {}", "Build:".blue().bold(), group.build);
        for scenario in &group.scenarios {
            println!("  {} {}", "Scenario:".cyan(), scenario.name.white().bold());
            println!("    {}", scenario.command.dimmed());
            for test in &scenario.test_cases {
                println!("    - {}", test.name());
            }
        }
        println!();
    }
}

#[derive(Serialize)]
struct GroupListing<'a> {
    build: &'a str,
    scenarios: Vec<ScenarioListing<'a>>,
}

#[derive(Serialize)]
struct ScenarioListing<'a> {
    name: &'a str,
    command: &'a str,
    test_cases: Vec<&'a str>,
}

impl<'a> From<&BuildGroup<'a>> for GroupListing<'a> {
    fn from(group: &BuildGroup<'a>) -> Self {
        Self {
            build: group.build,
            scenarios: group
                .scenarios
                .iter()
                .map(|&scenario| ScenarioListing {
                    name: &scenario.name,
                    command: &scenario.command,
                    test_cases: scenario.test_cases.iter().map(|tc| tc.name()).collect(),
                })
                .collect(),
        }
    }
}
