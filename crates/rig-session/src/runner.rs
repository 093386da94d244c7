//! Process execution seam.
//!
//! Every external process the session controller starts (scanner begin/end,
//! the build, the capture adapter) goes through a [`ProcessRunner`]. The
//! system runner blocks the calling task until the child exits; nothing is
//! retried or timed out here.

use std::future::Future;
use std::process::Stdio;

use rig_core::entities::BuildOutcome;
use rig_core::enums::Phase;
use tokio::process::Command;

use crate::invocation::Invocation;

pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` to completion and report its exit status and output.
    ///
    /// Never fails: a process that cannot be launched yields an outcome with
    /// no exit code and the launch error as its log.
    fn run(&self, phase: Phase, invocation: &Invocation) -> impl Future<Output = BuildOutcome> + Send;
}

/// Runs processes on the local machine with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, phase: Phase, invocation: &Invocation) -> BuildOutcome {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .envs(&invocation.env)
            .stdin(Stdio::null());
        for key in &invocation.env_remove {
            command.env_remove(key);
        }

        tracing::debug!(
            %phase,
            command = %invocation,
            dir = %invocation.working_dir.display(),
            "running process"
        );

        let (exit_code, log) = match command.output().await {
            Ok(output) => {
                let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
                log.push_str(&String::from_utf8_lossy(&output.stderr));
                (output.status.code(), log)
            }
            Err(err) => (None, format!("failed to launch {}: {err}", invocation.program)),
        };

        tracing::debug!(%phase, ?exit_code, log_bytes = log.len(), "process finished");
        BuildOutcome {
            phase,
            command: invocation.redacted(),
            exit_code,
            log,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_stderr_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::new("sh", dir.path())
            .arg("-c")
            .arg("echo out; echo err >&2; exit 3");

        let outcome = SystemRunner.run(Phase::Build, &inv).await;
        assert_eq!(outcome.exit_code, Some(3));
        assert!(outcome.log_contains("out"));
        assert!(outcome.log_contains("err"));
    }

    #[tokio::test]
    async fn applies_environment_changes() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::new("sh", dir.path())
            .arg("-c")
            .arg("echo \"opts=$SONAR_SCANNER_OPTS home=${SONAR_SCANNER_HOME:-unset}\"")
            .env("SONAR_SCANNER_OPTS", "-Xmx512m")
            .env_remove("SONAR_SCANNER_HOME");

        let outcome = SystemRunner.run(Phase::Begin, &inv).await;
        assert!(outcome.succeeded());
        assert!(outcome.log_contains("opts=-Xmx512m home=unset"));
    }

    #[tokio::test]
    async fn launch_failure_has_no_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::new("/definitely/not/a/program", dir.path());

        let outcome = SystemRunner.run(Phase::Build, &inv).await;
        assert_eq!(outcome.exit_code, None);
        assert!(outcome.log.starts_with("failed to launch /definitely/not/a/program"));
    }
}
