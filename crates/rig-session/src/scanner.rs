//! Scanner command lines for the begin and end steps.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rig_config::{ScannerConfig, ServerConfig};

use crate::invocation::Invocation;
use crate::runner::ProcessRunner;

/// Environment variable the scanner would use to find its own installation.
/// Removed so the configured executable is the one that runs.
const SCANNER_HOME_VAR: &str = "SONAR_SCANNER_HOME";

/// Environment variable carrying extra JVM options for the analysis engine.
const SCANNER_OPTS_VAR: &str = "SONAR_SCANNER_OPTS";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Credentials {
    None,
    Token(String),
    Basic { login: String, password: String },
}

/// The configured scanner plus the runner that executes it.
#[derive(Debug)]
pub struct Scanner<R> {
    executable: String,
    launcher: Option<String>,
    opts: Option<String>,
    host_url: String,
    credentials: Credentials,
    runner: R,
}

impl<R: ProcessRunner> Scanner<R> {
    #[must_use]
    pub fn new(scanner: &ScannerConfig, server: &ServerConfig, runner: R) -> Self {
        let credentials = if !server.token.is_empty() {
            Credentials::Token(server.token.clone())
        } else if !server.login.is_empty() {
            Credentials::Basic {
                login: server.login.clone(),
                password: server.password.clone(),
            }
        } else {
            Credentials::None
        };

        Self {
            executable: scanner.executable.clone(),
            launcher: scanner.launcher().map(str::to_string),
            opts: (!scanner.opts.is_empty()).then(|| scanner.opts.clone()),
            host_url: server.base_url().to_string(),
            credentials,
            runner,
        }
    }

    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.executable.is_empty()
    }

    /// `begin /k:<key> /n:<name> /v:<version> /d:sonar.host.url=<url> [credentials] [properties]`.
    pub(crate) fn begin_invocation(
        &self,
        source_root: &Path,
        key: &str,
        name: &str,
        version: &str,
        properties: &BTreeMap<String, String>,
    ) -> Invocation {
        self.base(source_root)
            .arg("begin")
            .arg(format!("/k:{key}"))
            .arg(format!("/n:{name}"))
            .arg(format!("/v:{version}"))
            .arg(format!("/d:sonar.host.url={}", self.host_url))
            .args(self.credential_args())
            .args(properties.iter().map(|(k, v)| format!("/d:{k}={v}")))
    }

    /// `end [credentials]`.
    pub(crate) fn end_invocation(&self, source_root: &Path) -> Invocation {
        self.base(source_root).arg("end").args(self.credential_args())
    }

    fn base(&self, source_root: &Path) -> Invocation {
        let mut inv = match &self.launcher {
            Some(launcher) => Invocation::new(launcher, source_root).arg(&self.executable),
            None => Invocation::new(&self.executable, source_root),
        };
        inv = inv.env_remove(SCANNER_HOME_VAR);
        if let Some(opts) = &self.opts {
            inv = inv.env(SCANNER_OPTS_VAR, opts);
        }
        inv
    }

    fn credential_args(&self) -> Vec<String> {
        match &self.credentials {
            Credentials::None => Vec::new(),
            Credentials::Token(token) => vec![format!("/d:sonar.login={token}")],
            Credentials::Basic { login, password } => vec![
                format!("/d:sonar.login={login}"),
                format!("/d:sonar.password={password}"),
            ],
        }
    }
}

/// The real build command a session runs between begin and end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    pub program: String,
    pub args: Vec<String>,
    /// Defaults to the session's source root.
    pub working_dir: Option<PathBuf>,
}

impl BuildStep {
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &rig_config::BuildConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    pub(crate) fn invocation(&self, source_root: &Path) -> Invocation {
        Invocation::new(
            &self.program,
            self.working_dir.as_deref().unwrap_or(source_root),
        )
        .args(self.args.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::SystemRunner;
    use pretty_assertions::assert_eq;

    fn scanner(token: &str, launcher: &str) -> Scanner<SystemRunner> {
        Scanner::new(
            &ScannerConfig {
                executable: "SonarScanner.MSBuild.exe".into(),
                launcher: launcher.into(),
                opts: "-Xmx1g".into(),
                ..ScannerConfig::default()
            },
            &ServerConfig {
                token: token.into(),
                ..ServerConfig::default()
            },
            SystemRunner,
        )
    }

    #[test]
    fn begin_command_line() {
        let mut props = BTreeMap::new();
        props.insert("sonar.verbose".to_string(), "true".to_string());
        let inv = scanner("squ_abc", "").begin_invocation(
            Path::new("/src/cpp"),
            "cpp",
            "Cpp",
            "1.0",
            &props,
        );

        assert_eq!(inv.program, "SonarScanner.MSBuild.exe");
        assert_eq!(
            inv.args,
            vec![
                "begin",
                "/k:cpp",
                "/n:Cpp",
                "/v:1.0",
                "/d:sonar.host.url=http://localhost:9000",
                "/d:sonar.login=squ_abc",
                "/d:sonar.verbose=true",
            ]
        );
        assert_eq!(inv.working_dir, Path::new("/src/cpp"));
        assert_eq!(inv.env_remove, vec!["SONAR_SCANNER_HOME"]);
        assert_eq!(inv.env.get("SONAR_SCANNER_OPTS").map(String::as_str), Some("-Xmx1g"));
        assert!(!inv.redacted().contains("squ_abc"));
    }

    #[test]
    fn launcher_runs_scanner_as_first_argument() {
        let inv = scanner("", "dotnet").end_invocation(Path::new("/src"));
        assert_eq!(inv.program, "dotnet");
        assert_eq!(inv.args, vec!["SonarScanner.MSBuild.exe", "end"]);
    }

    #[test]
    fn build_step_defaults_to_source_root() {
        let step = BuildStep::from_config(&rig_config::BuildConfig::default());
        let inv = step.invocation(Path::new("/src/vb"));
        assert_eq!(inv.program, "msbuild");
        assert_eq!(inv.args, vec!["/t:Rebuild"]);
        assert_eq!(inv.working_dir, Path::new("/src/vb"));
    }
}
