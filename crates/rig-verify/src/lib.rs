//! # rig-verify
//!
//! Result verification for scanrig.
//!
//! After a scan session ended, a [`Verifier`] waits for the server to finish
//! processing (per the configured [`CompletionPolicy`]), then queries issues
//! and measures and evaluates them against a scenario's [`Expectations`].
//!
//! Issue expectations use set containment; an exact count is only checked
//! when a scenario pins `total`. Measures are absent unless the server reports
//! exactly one value. Environment-dependent expectations are [`Expected`]
//! values resolved against the probed capability.

pub mod completion;
mod error;
pub mod expect;
pub mod issues;
pub mod report;
pub mod verifier;

pub use completion::CompletionPolicy;
pub use error::VerifyError;
pub use expect::{Expectations, Expected, IssueExpectation, LogExpectation, MeasureExpectation};
pub use issues::IssueSet;
pub use report::{Mismatch, VerificationReport};
pub use verifier::{Verifier, single_measure, verify_logs};
