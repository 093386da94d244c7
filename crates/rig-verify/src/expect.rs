//! Expectation tables.
//!
//! Expectations are data. Anything that depends on the environment is an
//! [`Expected::Gated`] value naming a [`Feature`]; it is resolved against the
//! probed [`ServerCapability`] once, at evaluation time.
//!
//! In scenario files a gated value is a table with `feature`, `with` and
//! `without` keys; anything else is a plain value:
//!
//! ```toml
//! [expect.issues]
//! feature = "external_issues"
//! with = { required = ["vbnet:S3385", "external_roslyn:CC0021"], total = 4 }
//! without = { required = ["vbnet:S3385"], total = 2 }
//!
//! [[expect.measures]]
//! component = "cpp"
//! metric = "ncloc"
//! value = 15
//! ```

use std::collections::BTreeSet;

use rig_core::entities::BuildOutcome;
use rig_core::enums::Phase;
use rig_core::{Feature, ServerCapability};
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;
use crate::issues::IssueSet;
use crate::report::Mismatch;

/// A value that is either fixed or depends on a capability fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected<T> {
    Gated { feature: Feature, with: T, without: T },
    Always(T),
}

impl<T> Expected<T> {
    /// The value that applies in the environment described by `capability`.
    #[must_use]
    pub fn resolve(&self, capability: &ServerCapability) -> &T {
        match self {
            Self::Always(value) => value,
            Self::Gated {
                feature,
                with,
                without,
            } => {
                if capability.has(feature) {
                    with
                } else {
                    without
                }
            }
        }
    }
}

impl<T> From<T> for Expected<T> {
    fn from(value: T) -> Self {
        Self::Always(value)
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Rule keys that must (or must not) be among the target's issues.
///
/// Containment only: other issues may be present unless `total` pins the
/// exact count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueExpectation {
    #[serde(default)]
    pub required: BTreeSet<String>,
    #[serde(default)]
    pub forbidden: BTreeSet<String>,
    #[serde(default)]
    pub total: Option<usize>,
}

impl IssueExpectation {
    #[must_use]
    pub fn requiring<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: rules.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    #[must_use]
    pub fn forbidding<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden.extend(rules.into_iter().map(Into::into));
        self
    }

    /// Compare against the issues actually reported.
    #[must_use]
    pub fn evaluate(&self, issues: &IssueSet) -> Vec<Mismatch> {
        let actual = issues.rule_keys();
        let mut mismatches = Vec::new();

        let missing: BTreeSet<String> = self.required.difference(&actual).cloned().collect();
        if !missing.is_empty() {
            mismatches.push(Mismatch::MissingRules {
                missing,
                actual: issues.sorted_rule_keys(),
            });
        }

        let present: BTreeSet<String> = self.forbidden.intersection(&actual).cloned().collect();
        if !present.is_empty() {
            mismatches.push(Mismatch::ForbiddenRules {
                present,
                actual: issues.sorted_rule_keys(),
            });
        }

        if let Some(expected) = self.total
            && expected != issues.len()
        {
            mismatches.push(Mismatch::IssueCount {
                expected,
                actual: issues.len(),
                rules: issues.sorted_rule_keys(),
            });
        }

        mismatches
    }
}

impl Expected<IssueExpectation> {
    /// A gated issue table must grow with the feature: the `with` rule set is
    /// a superset of `without`, and the two cases differ (in rules or, when
    /// both pin one, in total).
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidExpectation`] describing the contradiction.
    pub fn validate(&self) -> Result<(), VerifyError> {
        let Self::Gated {
            feature,
            with,
            without,
        } = self
        else {
            return Ok(());
        };

        if !with.required.is_superset(&without.required) {
            let extra: Vec<_> = without.required.difference(&with.required).collect();
            return Err(VerifyError::InvalidExpectation(format!(
                "issues gated on {feature}: rules {extra:?} are required without the feature but not with it"
            )));
        }
        if let (Some(a), Some(b)) = (with.total, without.total)
            && a == b
        {
            return Err(VerifyError::InvalidExpectation(format!(
                "issues gated on {feature}: both cases expect {a} issues"
            )));
        }
        if with.required == without.required && (with.total.is_none() || without.total.is_none()) {
            return Err(VerifyError::InvalidExpectation(format!(
                "issues gated on {feature}: both cases expect the same rules"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Measures
// ---------------------------------------------------------------------------

/// One metric of one component. No `value` means the measure must be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasureExpectation {
    pub component: Expected<String>,
    pub metric: String,
    #[serde(default)]
    pub value: Option<Expected<i64>>,
}

impl MeasureExpectation {
    #[must_use]
    pub fn new(component: impl Into<String>, metric: impl Into<String>, value: i64) -> Self {
        Self {
            component: Expected::Always(component.into()),
            metric: metric.into(),
            value: Some(Expected::Always(value)),
        }
    }

    #[must_use]
    pub fn component_for<'a>(&'a self, capability: &ServerCapability) -> &'a str {
        self.component.resolve(capability)
    }

    #[must_use]
    pub fn value_for(&self, capability: &ServerCapability) -> Option<i64> {
        self.value.as_ref().map(|v| *v.resolve(capability))
    }

    /// Compare against the measure actually reported.
    #[must_use]
    pub fn evaluate(&self, capability: &ServerCapability, actual: Option<i64>) -> Option<Mismatch> {
        let expected = self.value_for(capability);
        (expected != actual).then(|| Mismatch::Measure {
            component: self.component_for(capability).to_string(),
            metric: self.metric.clone(),
            expected,
            actual,
        })
    }
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// Substrings that must (or must not) appear in the log of one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogExpectation {
    pub phase: Phase,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub absent: Vec<String>,
}

impl LogExpectation {
    /// Compare against the outcome of the phase; `None` if it never ran.
    #[must_use]
    pub fn evaluate(&self, outcome: Option<&BuildOutcome>) -> Vec<Mismatch> {
        let Some(outcome) = outcome else {
            return vec![Mismatch::PhaseNotRun { phase: self.phase }];
        };

        let missing = self
            .contains
            .iter()
            .filter(|needle| !outcome.log_contains(needle))
            .map(|needle| Mismatch::LogMissing {
                phase: self.phase,
                needle: needle.clone(),
                tail: outcome.log_tail(20),
            });
        let forbidden = self
            .absent
            .iter()
            .filter(|needle| outcome.log_contains(needle))
            .map(|needle| Mismatch::LogForbidden {
                phase: self.phase,
                needle: needle.clone(),
            });
        missing.chain(forbidden).collect()
    }
}

// ---------------------------------------------------------------------------
// Scenario expectations
// ---------------------------------------------------------------------------

/// Everything one scenario expects after its session ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectations {
    #[serde(default)]
    pub issues: Option<Expected<IssueExpectation>>,
    #[serde(default)]
    pub measures: Vec<MeasureExpectation>,
    #[serde(default)]
    pub logs: Vec<LogExpectation>,
}

impl Expectations {
    /// Whether any expectation needs the server's results (as opposed to logs).
    #[must_use]
    pub fn queries_server(&self) -> bool {
        self.issues.is_some() || !self.measures.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidExpectation`] for a contradictory table.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if let Some(issues) = &self.issues {
            issues.validate()?;
        }
        for measure in &self.measures {
            if measure.metric.is_empty() {
                return Err(VerifyError::InvalidExpectation(
                    "measure expectation without a metric".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rig_core::entities::IssueRecord;

    fn caps(version: &str) -> ServerCapability {
        ServerCapability::new(version.parse().unwrap())
    }

    fn vbnet_issues() -> Expected<IssueExpectation> {
        Expected::Gated {
            feature: Feature::ExternalIssues,
            with: IssueExpectation::requiring([
                "vbnet:S3385",
                "vbnet:S2358",
                "external_roslyn:CC0021",
                "external_roslyn:CC0062",
            ])
            .with_total(4),
            without: IssueExpectation::requiring(["vbnet:S3385", "vbnet:S2358"])
                .forbidding(["external_roslyn:CC0021", "external_roslyn:CC0062"])
                .with_total(2),
        }
    }

    fn issues(rules: &[&str]) -> IssueSet {
        IssueSet::new(
            rules
                .iter()
                .map(|rule| IssueRecord::new(*rule, "my.project"))
                .collect(),
        )
    }

    #[test]
    fn gated_value_follows_capability() {
        let table = vbnet_issues();
        assert_eq!(table.resolve(&caps("7.4")).total, Some(4));
        assert_eq!(table.resolve(&caps("7.3")).total, Some(2));
        table.validate().unwrap();
    }

    #[test]
    fn containment_tolerates_incidental_rules() {
        let expectation = IssueExpectation::requiring(["cpp:S106"]);
        let actual = issues(&["cpp:S106", "cpp:S1135", "common-cpp:InsufficientCommentDensity"]);
        assert!(expectation.evaluate(&actual).is_empty());
    }

    #[test]
    fn missing_rule_reports_full_actual_list() {
        let expectation = IssueExpectation::requiring(["cpp:S106"]);
        let mismatches = expectation.evaluate(&issues(&["cpp:S1135", "cpp:S125"]));
        assert_eq!(
            mismatches,
            vec![Mismatch::MissingRules {
                missing: BTreeSet::from(["cpp:S106".to_string()]),
                actual: vec!["cpp:S1135".to_string(), "cpp:S125".to_string()],
            }]
        );
    }

    #[test]
    fn external_issues_present_on_old_server_are_flagged() {
        let table = vbnet_issues();
        let actual = issues(&["vbnet:S3385", "vbnet:S2358", "external_roslyn:CC0021", "external_roslyn:CC0062"]);
        let mismatches = table.resolve(&caps("7.3")).evaluate(&actual);
        assert_eq!(mismatches.len(), 2);
        assert!(matches!(mismatches[0], Mismatch::ForbiddenRules { .. }));
        assert!(matches!(
            mismatches[1],
            Mismatch::IssueCount { expected: 2, actual: 4, .. }
        ));
        assert!(table.resolve(&caps("7.4")).evaluate(&actual).is_empty());
    }

    #[test]
    fn gated_tables_must_grow_with_feature() {
        let shrinking = Expected::Gated {
            feature: Feature::ExternalIssues,
            with: IssueExpectation::requiring(["a:1"]).with_total(1),
            without: IssueExpectation::requiring(["a:1", "a:2"]).with_total(2),
        };
        assert!(shrinking.validate().is_err());

        let same_total = Expected::Gated {
            feature: Feature::ExternalIssues,
            with: IssueExpectation::requiring(["a:1", "a:2"]).with_total(2),
            without: IssueExpectation::requiring(["a:1"]).with_total(2),
        };
        assert!(same_total.validate().is_err());

        let identical = Expected::Gated {
            feature: Feature::ExternalIssues,
            with: IssueExpectation::requiring(["a:1"]),
            without: IssueExpectation::requiring(["a:1"]),
        };
        assert!(identical.validate().is_err());
    }

    #[test]
    fn measure_component_can_be_gated() {
        let expectation = MeasureExpectation {
            component: Expected::Gated {
                feature: Feature::ProjectModules,
                with: "my.project:my.project:60FFCB5D-E1F6-4B79-A58F-27ABC8B0B3F4:Module1.vb".into(),
                without: "my.project:ConsoleVBNet/Module1.vb".into(),
            },
            metric: "ncloc".into(),
            value: Some(10.into()),
        };
        assert!(expectation.component_for(&caps("7.5")).contains(":60FFCB5D-"));
        assert_eq!(
            expectation.component_for(&caps("7.6")),
            "my.project:ConsoleVBNet/Module1.vb"
        );
    }

    #[test]
    fn absent_measure_differs_from_zero() {
        let expects_absent = MeasureExpectation {
            value: None,
            ..MeasureExpectation::new("cpp", "coverage", 0)
        };
        let c = caps("7.9");
        assert!(expects_absent.evaluate(&c, None).is_none());
        assert!(expects_absent.evaluate(&c, Some(0)).is_some());

        let expects_zero = MeasureExpectation::new("cpp", "violations", 0);
        assert!(expects_zero.evaluate(&c, Some(0)).is_none());
        assert_eq!(
            expects_zero.evaluate(&c, None),
            Some(Mismatch::Measure {
                component: "cpp".into(),
                metric: "violations".into(),
                expected: Some(0),
                actual: None,
            })
        );
    }

    #[test]
    fn log_expectations() {
        let outcome = BuildOutcome {
            phase: Phase::End,
            command: "scanner end".into(),
            exit_code: Some(0),
            log: "INFO: ANALYSIS SUCCESSFUL\nINFO: Post-processing succeeded.".into(),
        };
        let expectation = LogExpectation {
            phase: Phase::End,
            contains: vec!["ANALYSIS SUCCESSFUL".into(), "EXECUTION SUCCESS".into()],
            absent: vec!["Invalid character encountered in file".into()],
        };

        let mismatches = expectation.evaluate(Some(&outcome));
        assert_eq!(mismatches.len(), 1);
        assert!(matches!(mismatches[0], Mismatch::LogMissing { ref needle, .. } if needle == "EXECUTION SUCCESS"));
        assert_eq!(
            expectation.evaluate(None),
            vec![Mismatch::PhaseNotRun { phase: Phase::End }]
        );
    }

    #[test]
    fn deserializes_plain_and_gated_values() {
        let parsed: Expectations = toml::from_str(
            r#"
            [issues]
            feature = "external_issues"
            with = { required = ["external_roslyn:CC0021"], total = 4 }
            without = { total = 2 }

            [[measures]]
            component = "cpp"
            metric = "ncloc"
            value = 15

            [[measures]]
            component = { feature = "project_modules", with = "a:b:c", without = "a:c" }
            metric = "ncloc"
            value = { feature = { min_version = { major = 7, minor = 4 } }, with = 10, without = 9 }

            [[logs]]
            phase = "end"
            absent = ["Invalid character encountered in file"]
            "#,
        )
        .unwrap();

        assert!(matches!(parsed.issues, Some(Expected::Gated { .. })));
        assert_eq!(parsed.measures[0], MeasureExpectation::new("cpp", "ncloc", 15));
        assert_eq!(parsed.measures[1].value_for(&caps("7.3")), Some(9));
        assert_eq!(parsed.logs[0].phase, Phase::End);
        parsed.validate().unwrap();
    }

    #[test]
    fn gated_table_with_unknown_feature_is_rejected() {
        let parsed = toml::from_str::<Expectations>(
            r#"
            [issues]
            feature = "external_issue"
            with = { required = ["vbnet:S112", "external_roslyn:CC0021"], total = 4 }
            without = { required = ["vbnet:S112"], total = 2 }
            "#,
        );
        assert!(parsed.is_err(), "parsed as {parsed:?}");
    }

    #[test]
    fn misspelled_sections_and_fields_are_rejected() {
        assert!(toml::from_str::<Expectations>("[isues]\nrequired = [\"cpp:S106\"]\n").is_err());
        assert!(toml::from_str::<Expectations>("[issues]\nrequire = [\"cpp:S106\"]\n").is_err());
        assert!(
            toml::from_str::<Expectations>(
                "[[measures]]\ncomponent = \"cpp\"\nmetric = \"ncloc\"\nvalu = 15\n"
            )
            .is_err()
        );
        assert!(
            toml::from_str::<Expectations>("[[logs]]\nphase = \"end\"\nabsnet = [\"x\"]\n")
                .is_err()
        );
    }
}
