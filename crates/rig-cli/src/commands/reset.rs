use std::fmt;

use anyhow::Context;
use rig_server::provision::purge;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ResetArgs;
use crate::commands::Verdict;
use crate::context::Environment;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ResetResponse {
    deleted: Vec<String>,
}

impl fmt::Display for ResetResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.deleted {
            writeln!(f, "reset {key}")?;
        }
        Ok(())
    }
}

/// Handle `rig reset`: delete leftover projects, tolerating ones already gone.
pub async fn handle(args: &ResetArgs, flags: &GlobalFlags) -> anyhow::Result<Verdict> {
    let env = Environment::load(flags)?;
    for key in &args.projects {
        purge(&env.client, key)
            .await
            .with_context(|| format!("failed to reset '{key}'"))?;
    }
    output(
        &ResetResponse {
            deleted: args.projects.clone(),
        },
        flags.format,
    )?;
    Ok(Verdict::Passed)
}
