//! Error types for ktest
//!
//! Build and test failures are not errors: they are reported on the console
//! and turned into a failed run. Everything here aborts before or outside
//! the build/test pipeline.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ktest
#[derive(Error, Debug)]
pub enum Error {
    // === Resolution Errors ===
    #[error("Scenario '{name}' is referenced from '{referenced_from}' but never declared")]
    UnknownScenario {
        name: String,
        referenced_from: String,
    },

    #[error("Scenario '{0}' is missing a command")]
    MissingCommand(String),

    #[error("Scenario reference cycle detected: {0}")]
    CycleDetected(String),

    // === Scenario File Errors ===
    #[error("Unknown script constant '{name}' in scenario '{scenario}'")]
    UnknownScript { name: String, scenario: String },

    #[error("Unknown build list '{name}' in scenario '{scenario}'")]
    UnknownBuildList { name: String, scenario: String },

    #[error("Invalid scenario file '{path}': {message}")]
    ScenarioFile { path: String, message: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Process Errors ===
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Automation program '{0}' not found in PATH. Install Tcl expect or set [interactive] program in ktest.toml")]
    AutomationProgramNotFound(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an unknown scenario error for a reference made from `referenced_from`
    pub fn unknown_scenario(name: &str, referenced_from: &str) -> Self {
        Self::UnknownScenario {
            name: name.to_string(),
            referenced_from: referenced_from.to_string(),
        }
    }

    /// Create a cycle error from the resolution path, closing it with `repeated`
    pub fn cycle_detected<S: AsRef<str>>(path: &[S], repeated: &str) -> Self {
        let mut names: Vec<&str> = path.iter().map(|s| s.as_ref()).collect();
        names.push(repeated);
        Self::CycleDetected(names.join(" -> "))
    }

    /// Create a spawn error
    pub fn spawn(program: &str, source: io::Error) -> Self {
        Self::Spawn {
            program: program.to_string(),
            source,
        }
    }

    /// Create a scenario file error
    pub fn scenario_file(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::ScenarioFile {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Whether this error stems from scenario declarations rather than the environment
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownScenario { .. }
                | Error::MissingCommand(_)
                | Error::CycleDetected(_)
                | Error::UnknownScript { .. }
                | Error::UnknownBuildList { .. }
                | Error::ScenarioFile { .. }
                | Error::Config(_)
                | Error::ConfigParse(_)
        )
    }
}
