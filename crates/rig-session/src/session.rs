//! The two-phase scan session.
//!
//! ```text
//! SessionBuilder ──begin──▶ ScanSession<Began> ──run_build──▶ ScanSession<Built>
//!                                 │                                 │
//!                                 └──────────────end────────────────┴──▶ EndedSession
//! ```
//!
//! Each step consumes the previous value, so a session cannot be ended before
//! it began, built twice, or ended twice:
//!
//! ```compile_fail
//! # use rig_session::{ScanSession, Scanner, SystemRunner};
//! # async fn f(scanner: &Scanner<SystemRunner>, key: &rig_core::ProjectKey) {
//! // No `end` before `begin`.
//! let ended = ScanSession::builder(key, "/src").end().await;
//! # }
//! ```
//!
//! ```compile_fail
//! # use rig_session::{ScanSession, Scanner, SystemRunner};
//! # async fn f(scanner: &Scanner<SystemRunner>, key: &rig_core::ProjectKey) {
//! let session = ScanSession::builder(key, "/src").begin(scanner).await.unwrap();
//! let ended = session.end().await.unwrap();
//! // An ended session has no `end`.
//! ended.end().await;
//! # }
//! ```

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rig_core::ProjectKey;
use rig_core::entities::BuildOutcome;
use rig_core::enums::{Phase, SessionState};

use crate::capture::{CaptureAdapter, CaptureReport, OUTPUT_PROPERTY};
use crate::error::SessionError;
use crate::runner::ProcessRunner;
use crate::scanner::{BuildStep, Scanner};

/// Scan properties recognized by the controller plus a raw passthrough map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanProperties {
    /// Capture adapter output directory, sent as `sonar.cfamily.build-wrapper-output`.
    pub capture_dir: Option<PathBuf>,
    /// Verbose analysis logs (`sonar.verbose=true`).
    pub debug: bool,
    /// Forwarded unmodified as `/d:<key>=<value>`.
    pub passthrough: BTreeMap<String, String>,
}

impl ScanProperties {
    /// Everything sent to the scanner's begin step.
    #[must_use]
    pub fn to_scanner_properties(&self) -> BTreeMap<String, String> {
        let mut props = self.passthrough.clone();
        if let Some(dir) = &self.capture_dir {
            props.insert(OUTPUT_PROPERTY.to_string(), dir.display().to_string());
        }
        if self.debug {
            props.insert("sonar.verbose".to_string(), "true".to_string());
        }
        props
    }
}

#[derive(Debug, Clone)]
struct Capture {
    adapter: CaptureAdapter,
    out_dir: PathBuf,
}

mod sealed {
    pub trait Sealed {}
}

/// Session states that may still be ended.
pub trait Open: sealed::Sealed {}

/// Marker: the begin step succeeded.
#[derive(Debug)]
pub struct Began;

/// Marker: the build step ran (successfully or not).
#[derive(Debug)]
pub struct Built;

impl sealed::Sealed for Began {}
impl sealed::Sealed for Built {}
impl Open for Began {}
impl Open for Built {}

/// Collects the begin arguments of a session.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    key: ProjectKey,
    source_root: PathBuf,
    name: Option<String>,
    version: String,
    properties: ScanProperties,
    adapter: Option<CaptureAdapter>,
}

impl SessionBuilder {
    /// Display name; defaults to the key.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Project version; defaults to `1.0`.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.properties.debug = debug;
        self
    }

    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.passthrough.insert(key.into(), value.into());
        self
    }

    /// Wrap the build with `adapter`, writing compilation records into `out_dir`.
    #[must_use]
    pub fn capture(mut self, adapter: CaptureAdapter, out_dir: impl Into<PathBuf>) -> Self {
        self.properties.capture_dir = Some(out_dir.into());
        self.adapter = Some(adapter);
        self
    }

    #[must_use]
    pub const fn properties(&self) -> &ScanProperties {
        &self.properties
    }

    /// Run the scanner's begin step in the source root.
    ///
    /// Nothing is started, and no session exists, unless this succeeds.
    ///
    /// # Errors
    ///
    /// - [`SessionError::SourceRootMissing`] if the source root does not exist
    /// - [`SessionError::ScannerNotConfigured`] without a scanner executable
    /// - [`SessionError::PhaseFailed`] if the begin step exits unsuccessfully
    ///   (for example because the server is unreachable)
    pub async fn begin<R: ProcessRunner>(
        self,
        scanner: &Scanner<R>,
    ) -> Result<ScanSession<'_, R, Began>, SessionError> {
        if !self.source_root.is_dir() {
            return Err(SessionError::SourceRootMissing(self.source_root));
        }
        if !scanner.is_configured() {
            return Err(SessionError::ScannerNotConfigured);
        }
        let state = SessionState::Idle.transition(SessionState::Began, self.key.as_str())?;

        let name = self.name.unwrap_or_else(|| self.key.to_string());
        let invocation = scanner.begin_invocation(
            &self.source_root,
            self.key.as_str(),
            &name,
            &self.version,
            &self.properties.to_scanner_properties(),
        );
        let outcome = scanner.runner().run(Phase::Begin, &invocation).await;
        if !outcome.succeeded() {
            return Err(SessionError::PhaseFailed {
                phase: Phase::Begin,
                outcome: Box::new(outcome),
            });
        }

        let capture = match (self.adapter, &self.properties.capture_dir) {
            (Some(adapter), Some(out_dir)) => Some(Capture {
                adapter,
                out_dir: out_dir.clone(),
            }),
            _ => None,
        };

        tracing::info!(key = %self.key, %name, version = %self.version, "scan session began");
        Ok(ScanSession {
            scanner,
            key: self.key,
            name,
            version: self.version,
            source_root: self.source_root,
            properties: self.properties,
            capture,
            state,
            begin: outcome,
            build: None,
            capture_report: None,
            _state: PhantomData,
        })
    }
}

/// An open scan session in state `S`.
#[derive(Debug)]
pub struct ScanSession<'s, R, S> {
    scanner: &'s Scanner<R>,
    key: ProjectKey,
    name: String,
    version: String,
    source_root: PathBuf,
    properties: ScanProperties,
    capture: Option<Capture>,
    state: SessionState,
    begin: BuildOutcome,
    build: Option<BuildOutcome>,
    capture_report: Option<CaptureReport>,
    _state: PhantomData<S>,
}

impl ScanSession<'_, (), ()> {
    /// Start describing a session for `key`, scanning `source_root`.
    #[must_use]
    pub fn builder(key: &ProjectKey, source_root: impl Into<PathBuf>) -> SessionBuilder {
        SessionBuilder {
            key: key.clone(),
            source_root: source_root.into(),
            name: None,
            version: "1.0".to_string(),
            properties: ScanProperties::default(),
            adapter: None,
        }
    }
}

impl<'s, R, S> ScanSession<'s, R, S> {
    #[must_use]
    pub const fn key(&self) -> &ProjectKey {
        &self.key
    }

    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn properties(&self) -> &ScanProperties {
        &self.properties
    }

    #[must_use]
    pub const fn begin_outcome(&self) -> &BuildOutcome {
        &self.begin
    }

    fn into_state<T>(self, state: SessionState) -> ScanSession<'s, R, T> {
        ScanSession {
            scanner: self.scanner,
            key: self.key,
            name: self.name,
            version: self.version,
            source_root: self.source_root,
            properties: self.properties,
            capture: self.capture,
            state,
            begin: self.begin,
            build: self.build,
            capture_report: self.capture_report,
            _state: PhantomData,
        }
    }
}

impl<'s, R: ProcessRunner> ScanSession<'s, R, Began> {
    /// Run the real build, wrapped with the capture adapter when one was given.
    ///
    /// A failing build does not fail the session: its exit status and log are
    /// kept in [`ScanSession::build_outcome`] for the caller to judge, and the
    /// session must still be ended.
    pub async fn run_build(mut self, step: &BuildStep) -> ScanSession<'s, R, Built> {
        let build = step.invocation(&self.source_root);
        let invocation = match &self.capture {
            Some(capture) => capture.adapter.wrap(&capture.out_dir, build),
            None => build,
        };

        let outcome = self.scanner.runner().run(Phase::Build, &invocation).await;
        if outcome.succeeded() {
            tracing::info!(key = %self.key, "build finished");
        } else {
            tracing::warn!(key = %self.key, exit_code = ?outcome.exit_code, "build failed");
        }

        if let Some(capture) = &self.capture {
            self.capture_report = read_capture_report(&capture.out_dir);
        }
        self.build = Some(outcome);

        let state = if self.state.can_transition_to(SessionState::Built) {
            SessionState::Built
        } else {
            self.state
        };
        self.into_state(state)
    }
}

impl<R> ScanSession<'_, R, Built> {
    #[must_use]
    pub fn build_outcome(&self) -> Option<&BuildOutcome> {
        self.build.as_ref()
    }

    #[must_use]
    pub const fn capture_report(&self) -> Option<&CaptureReport> {
        self.capture_report.as_ref()
    }
}

impl<R: ProcessRunner, S: Open> ScanSession<'_, R, S> {
    /// Run the scanner's end step, closing the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PhaseFailed`] if the end step exits
    /// unsuccessfully; the session is closed either way.
    pub async fn end(self) -> Result<EndedSession, SessionError> {
        let state = self.state.transition(SessionState::Ended, self.key.as_str())?;
        let invocation = self.scanner.end_invocation(&self.source_root);
        let outcome = self.scanner.runner().run(Phase::End, &invocation).await;
        if !outcome.succeeded() {
            return Err(SessionError::PhaseFailed {
                phase: Phase::End,
                outcome: Box::new(outcome),
            });
        }

        tracing::info!(key = %self.key, "scan session ended");
        Ok(EndedSession {
            key: self.key,
            name: self.name,
            version: self.version,
            state,
            begin: self.begin,
            build: self.build,
            end: outcome,
            capture_report: self.capture_report,
        })
    }
}

/// A closed session: everything the scanner and build printed, and what was
/// captured. Immutable.
#[derive(Debug, Clone)]
pub struct EndedSession {
    key: ProjectKey,
    name: String,
    version: String,
    state: SessionState,
    begin: BuildOutcome,
    build: Option<BuildOutcome>,
    end: BuildOutcome,
    capture_report: Option<CaptureReport>,
}

impl EndedSession {
    #[must_use]
    pub const fn key(&self) -> &ProjectKey {
        &self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Outcome of `phase`; `None` for a build that never ran.
    #[must_use]
    pub const fn outcome(&self, phase: Phase) -> Option<&BuildOutcome> {
        match phase {
            Phase::Begin => Some(&self.begin),
            Phase::Build => self.build.as_ref(),
            Phase::End => Some(&self.end),
        }
    }

    #[must_use]
    pub const fn build_outcome(&self) -> Option<&BuildOutcome> {
        self.build.as_ref()
    }

    #[must_use]
    pub const fn end_outcome(&self) -> &BuildOutcome {
        &self.end
    }

    #[must_use]
    pub const fn capture_report(&self) -> Option<&CaptureReport> {
        self.capture_report.as_ref()
    }
}

fn read_capture_report(out_dir: &Path) -> Option<CaptureReport> {
    match CaptureReport::load(out_dir) {
        Ok(report) if report.is_empty() => {
            tracing::warn!(dir = %out_dir.display(), "capture report lists no compilations");
            Some(report)
        }
        Ok(report) => {
            tracing::info!(compilations = report.len(), "captured build");
            Some(report)
        }
        Err(err) => {
            tracing::warn!(dir = %out_dir.display(), error = %err, "no capture report");
            None
        }
    }
}
