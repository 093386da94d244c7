//! # rig-session
//!
//! Scan session controller for scanrig.
//!
//! A scan is a strictly sequential handshake with the scanner executable:
//! `begin` registers the analysis with the server, the real build runs
//! (optionally wrapped by a capture adapter), and `end` uploads the results.
//! [`ScanSession`] models that handshake as typed states so invalid orderings
//! do not compile. Processes run through a [`ProcessRunner`], blocking the
//! calling task until they exit.
//!
//! Build failures are data, not errors: they are reported in the session's
//! [`BuildOutcome`](rig_core::entities::BuildOutcome) so a scenario can
//! expect them. Begin and end failures are errors.

pub mod capture;
mod error;
pub mod invocation;
pub mod runner;
pub mod scanner;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use capture::{CaptureAdapter, CaptureReport};
pub use error::SessionError;
pub use invocation::Invocation;
pub use runner::{ProcessRunner, SystemRunner};
pub use scanner::{BuildStep, Scanner};
pub use session::{Began, Built, EndedSession, ScanProperties, ScanSession, SessionBuilder};
