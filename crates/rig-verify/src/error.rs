//! Verification errors.
//!
//! These are failures to *obtain* results. Results that do not match
//! expectations are not errors; they are collected as
//! [`Mismatch`](crate::report::Mismatch)es in a report.

use rig_server::ServerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("{context}: {source}")]
    Server {
        context: String,
        #[source]
        source: ServerError,
    },

    /// The server did not finish processing the analysis within the poll budget.
    #[error("analysis of '{key}' still pending after {attempts} checks")]
    AnalysisIncomplete { key: String, attempts: u32 },

    /// The server finished processing the analysis unsuccessfully.
    #[error("analysis of '{key}' ended with {status}: {message}")]
    AnalysisFailed {
        key: String,
        status: String,
        message: String,
    },

    /// A measure that should be an integer is not.
    #[error("measure {metric} of '{component}' is not an integer: '{value}'")]
    NonNumeric {
        component: String,
        metric: String,
        value: String,
    },

    /// An expectation table contradicts itself.
    #[error("invalid expectation: {0}")]
    InvalidExpectation(String),
}

impl VerifyError {
    pub(crate) fn server(context: impl Into<String>) -> impl FnOnce(ServerError) -> Self {
        let context = context.into();
        move |source| Self::Server { context, source }
    }
}
