//! Runs one scenario end to end.
//!
//! probe → skip check → purge → provision → working copy → begin → build →
//! end → verify, then the provisioned state is reset whatever happened.

use std::path::Path;

use anyhow::{Context, bail};
use rig_core::entities::BuildOutcome;
use rig_core::{ProjectKey, ServerCapability};
use rig_server::Provisioner;
use rig_server::provision::purge;
use rig_session::{BuildStep, CaptureAdapter, ProcessRunner, ScanSession, Scanner};
use rig_verify::{CompletionPolicy, Mismatch, VerificationReport, Verifier, verify_logs};
use serde::Serialize;

use crate::context::Environment;
use crate::fixture::Workdir;
use crate::scenario::Scenario;

/// How a scenario ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    Passed,
    Failed,
    Skipped { reason: String },
    /// The scenario could not be carried out (environment, provisioning or
    /// scanner failure).
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub target: String,
    #[serde(flatten)]
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<VerificationReport>,
}

impl ScenarioResult {
    fn new(scenario: &Scenario, status: Status) -> Self {
        Self {
            scenario: scenario.name(),
            target: scenario.target.key.clone(),
            status,
            report: None,
        }
    }

    fn verified(scenario: &Scenario, report: VerificationReport) -> Self {
        let status = if report.passed() {
            Status::Passed
        } else {
            Status::Failed
        };
        Self {
            report: Some(report),
            ..Self::new(scenario, status)
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.status, Status::Failed | Status::Error { .. })
    }
}

/// Executes scenarios against one environment and scanner.
pub struct ScenarioRunner<'a, R> {
    env: &'a Environment,
    scanner: &'a Scanner<R>,
    keep_workdirs: bool,
}

impl<'a, R: ProcessRunner> ScenarioRunner<'a, R> {
    #[must_use]
    pub const fn new(env: &'a Environment, scanner: &'a Scanner<R>, keep_workdirs: bool) -> Self {
        Self {
            env,
            scanner,
            keep_workdirs,
        }
    }

    /// Run `scenario`. Failures to carry it out become [`Status::Error`].
    pub async fn run(&self, scenario: &Scenario) -> ScenarioResult {
        let result = match self.execute(scenario).await {
            Ok(result) => result,
            Err(error) => ScenarioResult::new(
                scenario,
                Status::Error {
                    message: format!("{error:#}"),
                },
            ),
        };
        match &result.status {
            Status::Passed => tracing::info!(scenario = %result.scenario, "passed"),
            Status::Skipped { reason } => tracing::info!(scenario = %result.scenario, %reason, "skipped"),
            Status::Failed => tracing::warn!(scenario = %result.scenario, "failed"),
            Status::Error { message } => tracing::error!(scenario = %result.scenario, %message, "error"),
        }
        result
    }

    async fn execute(&self, scenario: &Scenario) -> anyhow::Result<ScenarioResult> {
        let capability = self.env.probe().await?;
        if let Some(reason) = scenario.skip_reason(&capability) {
            return Ok(ScenarioResult::new(scenario, Status::Skipped { reason }));
        }

        let key = &scenario.target.key;
        purge(&self.env.client, key)
            .await
            .with_context(|| format!("failed to clear leftovers of '{key}'"))?;

        let mut provisioner = Provisioner::new(&self.env.client);
        let result = self.scan_and_verify(scenario, &capability, &mut provisioner).await;
        if let Err(error) = provisioner.reset().await {
            tracing::warn!(%key, %error, "failed to reset provisioned state");
        }
        result
    }

    async fn scan_and_verify(
        &self,
        scenario: &Scenario,
        capability: &ServerCapability,
        provisioner: &mut Provisioner<'_>,
    ) -> anyhow::Result<ScenarioResult> {
        let key = ProjectKey::new(&scenario.target.key)?;
        let name = scenario.target.display_name();

        provisioner.provision(key.as_str(), name).await?;
        for profile in &scenario.profiles {
            let handle = provisioner.load_profile(&scenario.resolve(&profile.path)).await?;
            if let Some(language) = &profile.language
                && *language != handle.language
            {
                bail!(
                    "profile '{}' is for {}, not {language}",
                    handle.name,
                    handle.language
                );
            }
            provisioner
                .associate(key.as_str(), &handle.language, &handle.name)
                .await?;
        }

        let config = &self.env.config;
        let workdir = Workdir::prepare(
            &scenario.project_dir(&config.general.projects_root),
            self.keep_workdirs || config.general.keep_workdirs,
        )?;

        let mut builder = ScanSession::builder(&key, workdir.source_root())
            .name(name)
            .version(scenario.target.version.as_str())
            .debug(scenario.scan.debug);
        for (property, value) in &scenario.scan.properties {
            builder = builder.property(property, value);
        }
        if scenario.source.capture {
            if !config.capture.is_configured() {
                bail!("scenario captures its build but [capture] adapter is not configured");
            }
            let adapter = CaptureAdapter::stage(Path::new(&config.capture.adapter), &workdir.staging_dir())?;
            builder = builder.capture(adapter, workdir.capture_dir());
        }
        let step = scenario.source.build.as_ref().map_or_else(
            || BuildStep::from_config(&config.build),
            |build| BuildStep::new(build.program.as_str(), &build.args),
        );

        let built = builder
            .begin(self.scanner)
            .await?
            .run_build(&step)
            .await;
        let begin = built.begin_outcome().clone();
        let build = built.build_outcome().cloned();
        let build_succeeded = build.as_ref().is_some_and(BuildOutcome::succeeded);
        let expect_failure = scenario.source.expect_build_failure;
        let ended = built.end().await;

        if build_succeeded && !expect_failure {
            let ended = ended?;
            let policy = CompletionPolicy::from(&config.completion);
            let verifier = Verifier::new(&self.env.client, capability, &ended, &policy).await?;
            let report = verifier.verify(&ended, &scenario.expect).await?;
            return Ok(ScenarioResult::verified(scenario, report));
        }

        // The build did not go as planned or was meant to fail: the server
        // holds no usable analysis, so only the logs are checked.
        let end = match ended {
            Ok(session) => Some(session.end_outcome().clone()),
            Err(error) => {
                tracing::warn!(%key, %error, "end step failed after build failure");
                error.outcome().cloned()
            }
        };
        let mut report = VerificationReport::new(key.as_str());
        report.record(build_status_mismatch(build.as_ref(), expect_failure));
        let outcomes: Vec<&BuildOutcome> = [Some(&begin), build.as_ref(), end.as_ref()]
            .into_iter()
            .flatten()
            .collect();
        verify_logs(&mut report, &scenario.expect.logs, &outcomes);
        Ok(ScenarioResult::verified(scenario, report))
    }
}

fn build_status_mismatch(build: Option<&BuildOutcome>, expect_failure: bool) -> Option<Mismatch> {
    let succeeded = build.is_some_and(BuildOutcome::succeeded);
    (succeeded == expect_failure).then(|| Mismatch::BuildStatus {
        expected_success: !expect_failure,
        exit_code: build.and_then(|b| b.exit_code),
        tail: build.map(|b| b.log_tail(20)).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rig_config::RigConfig;
    use rig_core::enums::Phase;
    use rig_server::test_support::{FakeServer, Route};
    use rig_session::testing::ScriptedRunner;
    use serde_json::json;
    use tempfile::TempDir;

    const PROFILE: &str = "<profile><name>ProfileForTestVBNet</name><language>vbnet</language>\
        <rules><rule><repositoryKey>vbnet</repositoryKey><key>S3385</key></rule></rules></profile>";

    /// A scenario directory with a profile and a one-file source project.
    fn layout(scenario: &str) -> (TempDir, Scenario) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("profiles")).unwrap();
        std::fs::write(dir.path().join("profiles/TestQualityProfileVBNet.xml"), PROFILE).unwrap();
        std::fs::create_dir_all(dir.path().join("projects/ConsoleVBNet")).unwrap();
        std::fs::write(dir.path().join("projects/ConsoleVBNet/Module1.vb"), "Module Module1").unwrap();
        let file = dir.path().join("vbnet.toml");
        std::fs::write(&file, scenario).unwrap();
        let scenario = Scenario::load(&file).unwrap();
        (dir, scenario)
    }

    const VBNET: &str = r#"
        [target]
        key = "my.project"

        [[profiles]]
        path = "profiles/TestQualityProfileVBNet.xml"
        language = "vbnet"

        [source]
        project = "ConsoleVBNet"

        [expect.issues]
        required = ["vbnet:S3385"]
    "#;

    fn environment(url: &str) -> Environment {
        let mut config = RigConfig::default();
        config.server.url = url.to_string();
        config.scanner.executable = "SonarScanner.MSBuild.exe".into();
        Environment::new(config).unwrap()
    }

    fn probe_routes(version: &str) -> Vec<Route> {
        vec![
            Route::get("/api/system/status").json(200, json!({"status": "UP"})),
            Route::get("/api/server/version").text(200, version),
            Route::get("/api/plugins/installed")
                .json(200, json!({"plugins": [{"key": "vbnet", "version": "7.10"}]})),
        ]
    }

    fn provisioning_routes() -> Vec<Route> {
        vec![
            Route::post("/api/projects/delete").text(200, ""),
            Route::get("/api/projects/search").json(200, json!({"components": []})),
            Route::post("/api/projects/create").json(200, json!({})),
            Route::post("/api/qualityprofiles/restore").json(200, json!({})),
            Route::post("/api/qualityprofiles/add_project").text(200, ""),
            Route::post("/api/qualityprofiles/delete").text(200, ""),
        ]
    }

    fn issues(rules: &[&str]) -> Route {
        let issues: Vec<_> = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| json!({"key": format!("i{i}"), "rule": rule, "component": "my.project"}))
            .collect();
        Route::get("/api/issues/search").json(
            200,
            json!({"paging": {"pageIndex": 1, "pageSize": 500, "total": rules.len()}, "issues": issues}),
        )
    }

    #[tokio::test]
    async fn passing_scenario_runs_every_phase_and_resets() {
        let (_dir, scenario) = layout(VBNET);
        let mut routes = probe_routes("7.9");
        routes.extend(provisioning_routes());
        routes.push(issues(&["vbnet:S3385", "vbnet:S1135"]));
        let server = FakeServer::start(routes);

        let env = environment(server.url());
        let scanner = Scanner::new(&env.config.scanner, &env.config.server, ScriptedRunner::new());
        let result = ScenarioRunner::new(&env, &scanner, false).run(&scenario).await;

        assert_eq!(result.status, Status::Passed);
        assert_eq!(result.scenario, "vbnet");
        assert_eq!(result.report.unwrap().checks, 1);
        assert_eq!(scanner.runner().phases(), vec![Phase::Begin, Phase::Build, Phase::End]);
        // Once before the scenario, once by the reset.
        assert_eq!(server.requests_to("POST", "/api/projects/delete").len(), 2);
        assert_eq!(server.requests_to("POST", "/api/qualityprofiles/delete").len(), 1);
    }

    #[tokio::test]
    async fn missing_rule_fails_with_report() {
        let (_dir, scenario) = layout(VBNET);
        let mut routes = probe_routes("7.9");
        routes.extend(provisioning_routes());
        routes.push(issues(&["vbnet:S1135"]));
        let server = FakeServer::start(routes);

        let env = environment(server.url());
        let scanner = Scanner::new(&env.config.scanner, &env.config.server, ScriptedRunner::new());
        let result = ScenarioRunner::new(&env, &scanner, false).run(&scenario).await;

        assert_eq!(result.status, Status::Failed);
        assert!(result.is_failure());
        let report = result.report.unwrap();
        assert!(matches!(report.mismatches[0], Mismatch::MissingRules { .. }));
    }

    #[tokio::test]
    async fn legacy_scanner_is_skipped_before_touching_the_server_state() {
        let text = format!("skip_when_scanner_version = [\"2.1.0.0\"]\n{VBNET}");
        let (_dir, scenario) = layout(&text);
        let server = FakeServer::start(probe_routes("7.9"));

        let mut env = environment(server.url());
        env.config.scanner.version = "2.1.0.0".into();
        let scanner = Scanner::new(&env.config.scanner, &env.config.server, ScriptedRunner::new());
        let result = ScenarioRunner::new(&env, &scanner, false).run(&scenario).await;

        assert!(matches!(result.status, Status::Skipped { .. }));
        assert!(!result.is_failure());
        assert!(scanner.runner().phases().is_empty());
        assert!(server.requests_to("POST", "/api/projects/delete").is_empty());
    }

    #[tokio::test]
    async fn unexpected_build_failure_still_ends_the_session() {
        let (_dir, scenario) = layout(VBNET);
        let mut routes = probe_routes("7.9");
        routes.extend(provisioning_routes());
        let server = FakeServer::start(routes);

        let env = environment(server.url());
        let runner = ScriptedRunner::new()
            .then(Some(0), "begin ok")
            .then(Some(1), "error BC30451: 'Foo' is not declared.");
        let scanner = Scanner::new(&env.config.scanner, &env.config.server, runner);
        let result = ScenarioRunner::new(&env, &scanner, false).run(&scenario).await;

        assert_eq!(result.status, Status::Failed);
        assert_eq!(scanner.runner().phases(), vec![Phase::Begin, Phase::Build, Phase::End]);
        let report = result.report.unwrap();
        assert_eq!(
            report.mismatches,
            vec![Mismatch::BuildStatus {
                expected_success: true,
                exit_code: Some(1),
                tail: "error BC30451: 'Foo' is not declared.".into(),
            }]
        );
        assert!(server.requests_to("GET", "/api/issues/search").is_empty());
    }

    #[tokio::test]
    async fn expected_build_failure_checks_the_logs() {
        let text = r#"
            [target]
            key = "my.project"

            [source]
            project = "ConsoleVBNet"
            expect_build_failure = true

            [[expect.logs]]
            phase = "end"
            contains = ["The build step did not complete"]
        "#;
        let (_dir, scenario) = layout(text);
        let mut routes = probe_routes("7.9");
        routes.extend(provisioning_routes());
        let server = FakeServer::start(routes);

        let env = environment(server.url());
        let runner = ScriptedRunner::new()
            .then(Some(0), "")
            .then(Some(1), "build broke")
            .then(Some(1), "ERROR: The build step did not complete");
        let scanner = Scanner::new(&env.config.scanner, &env.config.server, runner);
        let result = ScenarioRunner::new(&env, &scanner, false).run(&scenario).await;

        assert_eq!(result.status, Status::Passed);
        assert_eq!(result.report.unwrap().checks, 2);
    }

    #[tokio::test]
    async fn begin_failure_is_an_error_and_resets() {
        let (_dir, scenario) = layout(VBNET);
        let mut routes = probe_routes("7.9");
        routes.extend(provisioning_routes());
        let server = FakeServer::start(routes);

        let env = environment(server.url());
        let runner = ScriptedRunner::new().then(Some(1), "Unable to connect to server");
        let scanner = Scanner::new(&env.config.scanner, &env.config.server, runner);
        let result = ScenarioRunner::new(&env, &scanner, false).run(&scenario).await;

        let Status::Error { message } = &result.status else {
            panic!("expected error, got {:?}", result.status);
        };
        assert!(message.contains("begin"));
        assert_eq!(scanner.runner().phases(), vec![Phase::Begin]);
        assert_eq!(server.requests_to("POST", "/api/projects/delete").len(), 2);
    }

    #[tokio::test]
    async fn server_down_is_an_error() {
        let server = FakeServer::start(vec![
            Route::get("/api/system/status").json(200, json!({"status": "STARTING"})),
        ]);
        let (_dir, scenario) = layout(VBNET);

        let env = environment(server.url());
        let scanner = Scanner::new(&env.config.scanner, &env.config.server, ScriptedRunner::new());
        let result = ScenarioRunner::new(&env, &scanner, false).run(&scenario).await;

        assert!(matches!(result.status, Status::Error { .. }));
        assert!(scanner.runner().phases().is_empty());
    }

    #[test]
    fn result_serializes_flat() {
        let (_dir, scenario) = layout(VBNET);
        let result = ScenarioResult::new(
            &scenario,
            Status::Skipped {
                reason: "requires plugin 'cpp'".into(),
            },
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "scenario": "vbnet",
                "target": "my.project",
                "status": "skipped",
                "reason": "requires plugin 'cpp'"
            })
        );
    }
}
