//! Querying results of an ended session and evaluating expectations.

use rig_core::ServerCapability;
use rig_core::entities::BuildOutcome;
use rig_core::enums::Phase;
use rig_server::issues::IssueQuery;
use rig_server::measures::Measure;
use rig_server::{ServerClient, ServerError};
use rig_session::EndedSession;

use crate::completion::CompletionPolicy;
use crate::error::VerifyError;
use crate::expect::{Expectations, LogExpectation};
use crate::issues::IssueSet;
use crate::report::VerificationReport;

/// Read access to one target's results.
///
/// Only constructible from an [`EndedSession`], after the completion policy
/// is satisfied, so results are never read before the analysis was uploaded.
#[derive(Debug)]
pub struct Verifier<'a> {
    client: &'a ServerClient,
    capability: &'a ServerCapability,
    key: String,
}

impl<'a> Verifier<'a> {
    /// Wait for the session's results per `policy`.
    ///
    /// # Errors
    ///
    /// See [`CompletionPolicy::wait`].
    pub async fn new(
        client: &'a ServerClient,
        capability: &'a ServerCapability,
        session: &EndedSession,
        policy: &CompletionPolicy,
    ) -> Result<Self, VerifyError> {
        let key = session.key().to_string();
        policy.wait(client, &key).await?;
        Ok(Self {
            client,
            capability,
            key,
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// All issues reported for the target.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Server`] if the search fails.
    pub async fn issues(&self) -> Result<IssueSet, VerifyError> {
        let issues = self
            .client
            .search_issues(&IssueQuery::for_component(&self.key))
            .await
            .map_err(VerifyError::server(format!("searching issues of '{}'", self.key)))?;
        Ok(IssueSet::new(issues))
    }

    /// The integer value of `metric` for `component`.
    ///
    /// `None` unless the server reports exactly one value for the pair; an
    /// unknown component is absent too.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::NonNumeric`] for a value that is not an
    /// integer and [`VerifyError::Server`] if the query fails.
    pub async fn measure(&self, component: &str, metric: &str) -> Result<Option<i64>, VerifyError> {
        match self.client.component_measures(component, &[metric]).await {
            Ok(measures) => single_measure(component, metric, &measures),
            Err(ServerError::NotFound(_)) => {
                tracing::debug!(component, "component unknown to server, measure absent");
                Ok(None)
            }
            Err(source) => Err(VerifyError::Server {
                context: format!("reading {metric} of '{component}'"),
                source,
            }),
        }
    }

    /// Evaluate every expectation of a scenario against the server's results
    /// and the session's logs.
    ///
    /// # Errors
    ///
    /// Only for failures to obtain results; mismatches go into the report.
    pub async fn verify(
        &self,
        session: &EndedSession,
        expectations: &Expectations,
    ) -> Result<VerificationReport, VerifyError> {
        let mut report = VerificationReport::new(&self.key);

        if let Some(expected) = &expectations.issues {
            let issues = self.issues().await?;
            tracing::debug!(key = %self.key, count = issues.len(), "issues reported");
            report.record(expected.resolve(self.capability).evaluate(&issues));
        }

        for expectation in &expectations.measures {
            let component = expectation.component_for(self.capability);
            let actual = self.measure(component, &expectation.metric).await?;
            report.record(expectation.evaluate(self.capability, actual));
        }

        let outcomes: Vec<&BuildOutcome> = [
            session.outcome(Phase::Begin),
            session.outcome(Phase::Build),
            session.outcome(Phase::End),
        ]
        .into_iter()
        .flatten()
        .collect();
        verify_logs(&mut report, &expectations.logs, &outcomes);

        if report.passed() {
            tracing::info!(key = %self.key, checks = report.checks, "verification passed");
        } else {
            tracing::warn!(
                key = %self.key,
                failed = report.mismatches.len(),
                "verification failed"
            );
        }
        Ok(report)
    }
}

/// Evaluate log expectations against whichever phase outcomes exist.
///
/// Usable without an [`EndedSession`], e.g. when the end step itself failed
/// and only its outcome is left.
pub fn verify_logs(
    report: &mut VerificationReport,
    logs: &[LogExpectation],
    outcomes: &[&BuildOutcome],
) {
    for expectation in logs {
        let outcome = outcomes
            .iter()
            .copied()
            .find(|o| o.phase == expectation.phase);
        report.record(expectation.evaluate(outcome));
    }
}

/// Reduce raw measures to one integer: exactly one match for `metric`, with
/// a value, or absent.
///
/// # Errors
///
/// Returns [`VerifyError::NonNumeric`] if the single value is not an integer.
pub fn single_measure(
    component: &str,
    metric: &str,
    measures: &[Measure],
) -> Result<Option<i64>, VerifyError> {
    let mut matching = measures.iter().filter(|m| m.metric == metric);
    let (Some(only), None) = (matching.next(), matching.next()) else {
        return Ok(None);
    };
    let Some(raw) = only.value.as_deref() else {
        return Ok(None);
    };
    raw.trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|_| VerifyError::NonNumeric {
            component: component.to_string(),
            metric: metric.to_string(),
            value: raw.to_string(),
        })
}
