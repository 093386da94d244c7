use std::fmt;
use std::path::PathBuf;

use anyhow::Context;
use rig_config::RigConfig;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CheckArgs;
use crate::commands::Verdict;
use crate::output::output;
use crate::scenario::Scenario;

#[derive(Debug, Serialize)]
struct CheckedFile {
    file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    files: Vec<CheckedFile>,
}

impl CheckResponse {
    fn passed(&self) -> bool {
        self.files.iter().all(|f| f.error.is_none())
    }
}

impl fmt::Display for CheckResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            match &file.error {
                None => writeln!(f, "ok    {}", file.file.display())?,
                Some(error) => writeln!(f, "FAIL  {}: {error}", file.file.display())?,
            }
        }
        Ok(())
    }
}

fn check_files(files: &[PathBuf], projects_root: &str) -> CheckResponse {
    let files = files
        .iter()
        .map(|file| CheckedFile {
            file: file.clone(),
            error: Scenario::load(file)
                .and_then(|scenario| scenario.check(projects_root))
                .err()
                .map(|error| format!("{error:#}")),
        })
        .collect();
    CheckResponse { files }
}

/// Handle `rig check`: validate scenarios without contacting the server.
pub fn handle(args: &CheckArgs, flags: &GlobalFlags) -> anyhow::Result<Verdict> {
    let config = RigConfig::load_with_dotenv(flags.config.as_deref())
        .context("failed to load configuration")?;
    let response = check_files(&args.files, &config.general.projects_root);
    output(&response, flags.format)?;
    Ok(if response.passed() {
        Verdict::Passed
    } else {
        Verdict::Failed
    })
}
