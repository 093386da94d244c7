use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Print the server and scanner capabilities scenarios are gated on.
    Probe,
    /// Validate scenario files without contacting the server.
    Check(CheckArgs),
    /// Run scenarios against the configured server and scanner.
    Run(RunArgs),
    /// Delete analysis targets left behind on the server.
    Reset(ResetArgs),
}

/// Arguments for `rig check`.
#[derive(Clone, Debug, Args)]
pub struct CheckArgs {
    /// Scenario files (TOML).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for `rig run`.
#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Scenario files (TOML), run in the given order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Keep each scenario's working copy instead of deleting it.
    #[arg(long)]
    pub keep_workdirs: bool,
    /// Stop after the first scenario that does not pass.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for `rig reset`.
#[derive(Clone, Debug, Args)]
pub struct ResetArgs {
    /// Project key to delete (repeatable).
    #[arg(long = "project", required = true)]
    pub projects: Vec<String>,
}
