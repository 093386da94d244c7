use std::fmt;

use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::commands::Verdict;
use crate::context::Environment;
use crate::output::output;
use crate::runner::{ScenarioResult, ScenarioRunner, Status};
use crate::scenario::Scenario;

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    passed: usize,
    failed: usize,
    skipped: usize,
    scenarios: Vec<ScenarioResult>,
}

impl RunSummary {
    fn push(&mut self, result: ScenarioResult) {
        match result.status {
            Status::Passed => self.passed += 1,
            Status::Skipped { .. } => self.skipped += 1,
            Status::Failed | Status::Error { .. } => self.failed += 1,
        }
        self.scenarios.push(result);
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.scenarios {
            match &result.status {
                Status::Passed => writeln!(f, "PASS  {}", result.scenario)?,
                Status::Skipped { reason } => writeln!(f, "SKIP  {} ({reason})", result.scenario)?,
                Status::Failed => writeln!(f, "FAIL  {}", result.scenario)?,
                Status::Error { message } => writeln!(f, "ERROR {}: {message}", result.scenario)?,
            }
            if let Some(report) = result.report.as_ref().filter(|r| !r.passed()) {
                writeln!(f, "{report}")?;
            }
        }
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed, self.failed, self.skipped
        )
    }
}

/// Handle `rig run`: execute scenarios in order, one at a time.
pub async fn handle(args: &RunArgs, flags: &GlobalFlags) -> anyhow::Result<Verdict> {
    let scenarios = args
        .files
        .iter()
        .map(|file| Scenario::load(file))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let env = Environment::load(flags)?;
    let scanner = env.scanner();
    let runner = ScenarioRunner::new(&env, &scanner, args.keep_workdirs);

    let mut summary = RunSummary::default();
    for scenario in &scenarios {
        tracing::info!(scenario = %scenario.file().display(), "running scenario");
        let result = runner.run(scenario).await;
        let stop = args.fail_fast && result.is_failure();
        summary.push(result);
        if stop {
            break;
        }
    }

    output(&summary, flags.format)?;
    Ok(if summary.failed == 0 {
        Verdict::Passed
    } else {
        Verdict::Failed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(scenario: &str, status: Status) -> ScenarioResult {
        ScenarioResult {
            scenario: scenario.into(),
            target: scenario.into(),
            status,
            report: None,
        }
    }

    #[test]
    fn summary_counts_errors_as_failures() {
        let mut summary = RunSummary::default();
        summary.push(result("cpp", Status::Passed));
        summary.push(result(
            "vbnet",
            Status::Error {
                message: "environment probe failed".into(),
            },
        ));
        summary.push(result(
            "legacy",
            Status::Skipped {
                reason: "not applicable to scanner 2.1.0.0".into(),
            },
        ));

        assert_eq!((summary.passed, summary.failed, summary.skipped), (1, 1, 1));
        assert_eq!(
            summary.to_string(),
            "PASS  cpp\n\
             ERROR vbnet: environment probe failed\n\
             SKIP  legacy (not applicable to scanner 2.1.0.0)\n\
             1 passed, 1 failed, 1 skipped"
        );
    }
}
