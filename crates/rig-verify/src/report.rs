//! Verification reports.
//!
//! A report collects every mismatch of a scenario rather than stopping at
//! the first, and issue mismatches carry the complete list of reported rule
//! keys: partial server results are the usual failure and need the full
//! picture to diagnose.

use std::collections::BTreeSet;
use std::fmt;

use rig_core::enums::Phase;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    MissingRules {
        missing: BTreeSet<String>,
        actual: Vec<String>,
    },
    ForbiddenRules {
        present: BTreeSet<String>,
        actual: Vec<String>,
    },
    IssueCount {
        expected: usize,
        actual: usize,
        rules: Vec<String>,
    },
    Measure {
        component: String,
        metric: String,
        expected: Option<i64>,
        actual: Option<i64>,
    },
    LogMissing {
        phase: Phase,
        needle: String,
        tail: String,
    },
    LogForbidden {
        phase: Phase,
        needle: String,
    },
    PhaseNotRun {
        phase: Phase,
    },
    /// The build succeeded although it should have failed, or the reverse.
    BuildStatus {
        expected_success: bool,
        exit_code: Option<i32>,
        tail: String,
    },
}

fn value(v: Option<i64>) -> String {
    v.map_or_else(|| "absent".to_string(), |v| v.to_string())
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRules { missing, actual } => write!(
                f,
                "expected rules {missing:?} not reported; actual rules ({}): {actual:?}",
                actual.len()
            ),
            Self::ForbiddenRules { present, actual } => write!(
                f,
                "unexpected rules {present:?} reported; actual rules ({}): {actual:?}",
                actual.len()
            ),
            Self::IssueCount {
                expected,
                actual,
                rules,
            } => write!(
                f,
                "expected {expected} issues, got {actual}; actual rules: {rules:?}"
            ),
            Self::Measure {
                component,
                metric,
                expected,
                actual,
            } => write!(
                f,
                "measure {metric} of '{component}': expected {}, got {}",
                value(*expected),
                value(*actual)
            ),
            Self::LogMissing { phase, needle, tail } => write!(
                f,
                "{phase} log does not contain '{needle}'; log ends with:\n{tail}"
            ),
            Self::LogForbidden { phase, needle } => {
                write!(f, "{phase} log contains '{needle}'")
            }
            Self::PhaseNotRun { phase } => write!(f, "{phase} step never ran"),
            Self::BuildStatus {
                expected_success: true,
                exit_code,
                tail,
            } => write!(
                f,
                "build failed (exit {}); log ends with:\n{tail}",
                exit_code.map_or_else(|| "none".to_string(), |c| c.to_string())
            ),
            Self::BuildStatus {
                expected_success: false,
                ..
            } => f.write_str("build succeeded but was expected to fail"),
        }
    }
}

/// Every mismatch found for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub target: String,
    /// Number of expectations evaluated.
    pub checks: usize,
    /// Expectations that produced at least one mismatch.
    pub failed: usize,
    pub mismatches: Vec<Mismatch>,
}

impl VerificationReport {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Record one evaluated expectation and whatever it found.
    pub fn record(&mut self, mismatches: impl IntoIterator<Item = Mismatch>) {
        self.checks += 1;
        let before = self.mismatches.len();
        self.mismatches.extend(mismatches);
        if self.mismatches.len() > before {
            self.failed += 1;
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return write!(f, "{}: {} checks passed", self.target, self.checks);
        }
        writeln!(
            f,
            "{}: {} of {} checks failed, {} mismatches",
            self.target,
            self.failed,
            self.checks,
            self.mismatches.len()
        )?;
        for mismatch in &self.mismatches {
            writeln!(f, "  - {mismatch}")?;
        }
        Ok(())
    }
}
