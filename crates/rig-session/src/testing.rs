//! Scripted [`ProcessRunner`] for protocol tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use rig_core::entities::BuildOutcome;
use rig_core::enums::Phase;

use crate::invocation::Invocation;
use crate::runner::ProcessRunner;

#[derive(Debug, Clone)]
struct Step {
    exit_code: Option<i32>,
    log: String,
    writes: Vec<(PathBuf, String)>,
}

/// Answers each run with the next scripted step; once the script is used up
/// every run succeeds with an empty log. Records every invocation.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(Phase, Invocation)>>,
}

impl ScriptedRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a run that exits with `exit_code` and prints `log`.
    #[must_use]
    pub fn then(self, exit_code: Option<i32>, log: &str) -> Self {
        self.push(Step {
            exit_code,
            log: log.to_string(),
            writes: Vec::new(),
        })
    }

    /// Queue a run that also writes `contents` to `path`, the way a capture
    /// adapter leaves its report behind.
    #[must_use]
    pub fn then_writing(self, exit_code: Option<i32>, log: &str, path: PathBuf, contents: &str) -> Self {
        self.push(Step {
            exit_code,
            log: log.to_string(),
            writes: vec![(path, contents.to_string())],
        })
    }

    fn push(self, step: Step) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
        self
    }

    /// Every invocation run so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(Phase, Invocation)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn phases(&self) -> Vec<Phase> {
        self.calls().into_iter().map(|(phase, _)| phase).collect()
    }
}

impl ProcessRunner for ScriptedRunner {
    async fn run(&self, phase: Phase, invocation: &Invocation) -> BuildOutcome {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((phase, invocation.clone()));
        let step = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Step {
                exit_code: Some(0),
                log: String::new(),
                writes: Vec::new(),
            });

        for (path, contents) in &step.writes {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = std::fs::write(path, contents);
        }

        BuildOutcome {
            phase,
            command: invocation.redacted(),
            exit_code: step.exit_code,
            log: step.log,
        }
    }
}
