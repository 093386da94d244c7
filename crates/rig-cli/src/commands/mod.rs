pub mod check;
pub mod dispatch;
pub mod probe;
pub mod reset;
pub mod run;

/// How a command that completed without a harness error wants the process
/// to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Everything passed or was skipped.
    Passed,
    /// At least one scenario failed.
    Failed,
}
