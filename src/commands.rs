//! CLI command definitions
//!
//! Defines the clap commands for the ktest CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Where scenarios come from
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Scenario files to load (default: discovered under the repository top)
    pub files: Vec<PathBuf>,

    /// Repository top (default: nearest ancestor containing a marker entry)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every variant and run all scenarios, stopping at the first failure
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Echo build and test output (same as KTEST_OUTPUT=YES)
        #[arg(long, short)]
        verbose: bool,

        /// Only run scenarios with this exact name (can be repeated)
        #[arg(long)]
        only: Vec<String>,
    },

    /// Show build groups and resolved test cases without running anything
    List {
        #[command(flatten)]
        source: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print what each test case of a scenario would execute
    Explain {
        /// Scenario name
        scenario: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}

impl Commands {
    /// Whether the command asked for verbose output
    pub fn verbose(&self) -> bool {
        matches!(self, Commands::Run { verbose: true, .. })
    }
}
