//! Configuration file handling
//!
//! Settings come from `ktest.toml` at the repository top, falling back to the
//! per-user config file, falling back to built-in defaults. The per-user file
//! is also what supplies the repository top markers, since it can be read
//! before the top is known.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::{config_path, PROJECT_CONFIG_FILE};
use super::Result;

/// Environment variable that switches on echoing of subprocess output
pub const OUTPUT_ENV_VAR: &str = "KTEST_OUTPUT";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Interactive runner settings
    #[serde(default)]
    pub interactive: InteractiveConfig,

    /// Scenario file discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Console output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Seconds without matching output before an interactive test fails
    #[serde(default = "default_idle")]
    pub idle_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            idle_secs: default_idle(),
        }
    }
}

fn default_idle() -> u64 {
    5
}

/// Settings for the interactive (expect-driven) runner
#[derive(Debug, Deserialize)]
pub struct InteractiveConfig {
    /// Automation program that reads the generated script on stdin
    #[serde(default = "default_program")]
    pub program: String,

    /// Fail when the spawned process closes its output before the script finishes
    #[serde(default = "default_true")]
    pub eof_guard: bool,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            eof_guard: true,
        }
    }
}

fn default_program() -> String {
    "expect".to_string()
}

fn default_true() -> bool {
    true
}

/// Where scenario files live and how the repository top is recognised
#[derive(Debug, Deserialize)]
pub struct DiscoveryConfig {
    /// Glob, relative to the repository top, matching scenario files
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Entries whose presence marks a directory as the repository top
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            markers: default_markers(),
        }
    }
}

fn default_pattern() -> String {
    "test/test_*.yaml".to_string()
}

fn default_markers() -> Vec<String> {
    ["kernel", "Makefile", "grub.cfg", "build"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Console output settings
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Echo build and test process output to the console
    #[serde(default)]
    pub echo: bool,
}

impl Config {
    /// Load configuration for a repository rooted at `root`
    ///
    /// Returns default configuration if no config file exists
    pub fn load(root: &Path) -> Result<Self> {
        let project = root.join(PROJECT_CONFIG_FILE);
        if project.exists() {
            return Self::load_from(&project);
        }

        Self::load_user()
    }

    /// Load the per-user configuration, or defaults if there is none
    pub fn load_user() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;

        if config.timeouts.idle_secs == 0 {
            return Err(super::Error::Config(
                "[timeouts] idle_secs must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Idle timeout applied to interactive test cases
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.idle_secs)
    }

    /// Whether process output should be echoed, taking the environment into account
    pub fn echo_output(&self) -> bool {
        match std::env::var(OUTPUT_ENV_VAR) {
            Ok(value) => echo_enabled(&value),
            Err(_) => self.output.echo,
        }
    }
}

/// Any value other than `NO` (case-insensitive) or an empty string turns echo on
pub fn echo_enabled(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case("no")
}
