//! Entity structs for the analysis model.

mod issue;
mod measure;
mod outcome;
mod profile;
mod target;

pub use issue::IssueRecord;
pub use measure::MeasureRecord;
pub use outcome::BuildOutcome;
pub use profile::{ProfileHandle, QualityProfile, RuleActivation};
pub use target::AnalysisTarget;
