use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands::{self, Verdict};

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, flags: &GlobalFlags) -> anyhow::Result<Verdict> {
    match command {
        Commands::Probe => commands::probe::handle(flags).await,
        Commands::Check(args) => commands::check::handle(&args, flags),
        Commands::Run(args) => commands::run::handle(&args, flags).await,
        Commands::Reset(args) => commands::reset::handle(&args, flags).await,
    }
}
