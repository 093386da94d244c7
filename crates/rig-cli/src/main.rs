use clap::Parser;

mod cli;
mod commands;
mod context;
mod fixture;
mod output;
mod runner;
mod scenario;

use commands::Verdict;

/// Exit code when at least one scenario failed.
const EXIT_SCENARIO_FAILED: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(Verdict::Passed) => {}
        Ok(Verdict::Failed) => std::process::exit(EXIT_SCENARIO_FAILED),
        Err(error) => {
            eprintln!("rig error: {error:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<Verdict> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    commands::dispatch::dispatch(cli.command, &flags).await
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("SCANRIG_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
