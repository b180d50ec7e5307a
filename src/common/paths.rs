//! Repository, configuration, and scenario file locations

use std::path::{Path, PathBuf};

use super::config::DiscoveryConfig;
use super::{Error, Result};

/// Name used for per-user configuration directories
const APP_NAME: &str = "ktest";

/// Config file looked up at the repository top
pub const PROJECT_CONFIG_FILE: &str = "ktest.toml";

/// Find the repository top starting at `start`
///
/// Walks up until a directory contains at least one of `markers`.
pub fn find_repository_top(start: &Path, markers: &[String]) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        if markers.iter().any(|marker| dir.join(marker).exists()) {
            return Ok(dir.to_path_buf());
        }
        dir = dir.parent().ok_or_else(|| {
            Error::Config(format!(
                "No repository top found above '{}' (looked for: {})",
                start.display(),
                markers.join(", ")
            ))
        })?;
    }
}

/// Entries that mark the repository top: the configured markers plus the project config file
pub fn top_markers(discovery: &DiscoveryConfig) -> Vec<String> {
    let mut markers = discovery.markers.clone();
    if !markers.iter().any(|m| m == PROJECT_CONFIG_FILE) {
        markers.push(PROJECT_CONFIG_FILE.to_string());
    }
    markers
}

/// Discover scenario files under `root`, sorted by path
pub fn discover_scenario_files(root: &Path, discovery: &DiscoveryConfig) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        discovery.pattern
    );

    let entries = glob::glob(&pattern)
        .map_err(|e| Error::Config(format!("Invalid discovery pattern '{}': {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => tracing::warn!("Skipping unreadable scenario path: {}", e),
        }
    }
    files.sort();

    tracing::debug!(count = files.len(), %pattern, "discovered scenario files");
    Ok(files)
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/ktest/`
/// - macOS: `~/Library/Application Support/ktest/`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the per-user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
