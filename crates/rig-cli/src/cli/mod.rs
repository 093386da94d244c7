use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `rig` binary.
#[derive(Debug, Parser)]
#[command(name = "rig", version, about = "scanrig - scanner integration test rig")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file layered over the user and project config
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text, json
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            config: self.config.clone(),
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["rig", "--format", "json", "--verbose", "probe"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Probe));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["rig", "probe", "--config", "ci.toml", "--quiet"])
            .expect("cli should parse");

        assert!(cli.quiet);
        assert_eq!(cli.global_flags().config.as_deref(), Some(Path::new("ci.toml")));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn run_takes_files_and_flags() {
        let cli = Cli::try_parse_from([
            "rig",
            "run",
            "scenarios/cpp.toml",
            "scenarios/vbnet.toml",
            "--fail-fast",
        ])
        .expect("cli should parse");

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.files.len(), 2);
        assert!(args.fail_fast);
        assert!(!args.keep_workdirs);
    }

    #[test]
    fn run_requires_files() {
        assert!(Cli::try_parse_from(["rig", "run"]).is_err());
    }

    #[test]
    fn reset_collects_repeated_projects() {
        let cli = Cli::try_parse_from(["rig", "reset", "--project", "cpp", "--project", "my.project"])
            .expect("cli should parse");
        let Commands::Reset(args) = cli.command else {
            panic!("expected reset");
        };
        assert_eq!(args.projects, vec!["cpp", "my.project"]);
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["rig", "--format", "xml", "probe"]).is_err());
    }
}
