//! Repository discovery and scenario loading for CLI commands

use std::path::{Path, PathBuf};

use crate::commands::SourceArgs;
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::scenario::{load_scenarios, RunnerSettings, Scenario};

/// The repository a command operates on
#[derive(Debug)]
pub struct Workspace {
    /// Repository top; builds and tests run here
    pub root: PathBuf,
    pub config: Config,
    /// Scenario files, in load order
    pub files: Vec<PathBuf>,
}

impl Workspace {
    /// Locate the repository, load its configuration, and pick scenario files
    pub fn open(source: &SourceArgs) -> Result<Self> {
        let cwd = std::env::current_dir()?;

        let root = match &source.root {
            Some(root) => absolute(&cwd, root),
            // The project config lives at the root, so markers come from the user config
            None => {
                let user = Config::load_user()?;
                paths::find_repository_top(&cwd, &paths::top_markers(&user.discovery))?
            }
        };
        let config = Config::load(&root)?;

        let files = if source.files.is_empty() {
            paths::discover_scenario_files(&root, &config.discovery)?
        } else {
            source.files.iter().map(|f| absolute(&cwd, f)).collect()
        };

        tracing::info!(root = %root.display(), files = files.len(), "opened workspace");
        Ok(Self {
            root,
            config,
            files,
        })
    }

    /// Load and resolve every scenario file, concatenated in file order
    pub fn load_scenarios(&self, settings: &RunnerSettings) -> Result<Vec<Scenario>> {
        let mut scenarios = Vec::new();
        for file in &self.files {
            let loaded = load_scenarios(file, settings)?;
            for scenario in loaded.iter().filter(|s| s.builds.is_empty()) {
                tracing::warn!(
                    scenario = %scenario.name,
                    file = %file.display(),
                    "scenario has an empty build list and will never run"
                );
            }
            scenarios.extend(loaded);
        }
        Ok(scenarios)
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        cwd.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Fail early when a runner needs a program that is not installed
pub fn ensure_programs_available(scenarios: &[Scenario]) -> Result<()> {
    let mut checked: Vec<&str> = Vec::new();
    let required = scenarios
        .iter()
        .flat_map(|s| s.test_cases.iter())
        .filter_map(|tc| tc.required_program());

    for program in required {
        if checked.contains(&program) {
            continue;
        }
        which::which(program).map_err(|_| Error::AutomationProgramNotFound(program.to_string()))?;
        checked.push(program);
    }
    Ok(())
}
