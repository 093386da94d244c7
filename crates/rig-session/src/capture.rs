//! Capture adapter staging and the compilation report it leaves behind.
//!
//! The adapter intercepts a native build and records each compiler
//! invocation under its `--out-dir`. The analysis reads that directory during
//! the end step; the controller only stages the adapter, wraps the build with
//! it and reports what it captured.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SessionError;
use crate::invocation::Invocation;

/// Executable names the adapter ships under, per platform.
pub const ADAPTER_NAMES: &[&str] = &[
    "build-wrapper-linux-x86-64",
    "build-wrapper-win-x86-64.exe",
    "build-wrapper-win-x86-32.exe",
    "build-wrapper-macosx-x86",
];

/// Report file the adapter writes into its output directory.
pub const REPORT_FILE: &str = "build-wrapper-dump.json";

/// Scan property that tells the analysis where the capture output lives.
pub const OUTPUT_PROPERTY: &str = "sonar.cfamily.build-wrapper-output";

/// A capture adapter copied into a scenario's staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureAdapter {
    path: PathBuf,
}

impl CaptureAdapter {
    /// Find the adapter executable at `configured`: either the executable
    /// itself or a directory holding one of [`ADAPTER_NAMES`] (directly or
    /// one level down, as unpacked archives lay it out).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AdapterNotFound`] if nothing matches.
    pub fn locate(configured: &Path) -> Result<PathBuf, SessionError> {
        if configured.is_file() {
            return Ok(configured.to_path_buf());
        }
        if configured.is_dir() {
            if let Some(found) = find_known(configured) {
                return Ok(found);
            }
            let nested = fs::read_dir(configured)
                .map_err(|source| SessionError::Staging {
                    path: configured.to_path_buf(),
                    source,
                })?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .find_map(|dir| find_known(&dir));
            if let Some(found) = nested {
                return Ok(found);
            }
        }
        Err(SessionError::AdapterNotFound(configured.to_path_buf()))
    }

    /// Locate the adapter at `configured` and copy it into `staging_dir`,
    /// marking the copy executable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AdapterNotFound`] or [`SessionError::Staging`].
    pub fn stage(configured: &Path, staging_dir: &Path) -> Result<Self, SessionError> {
        let source = Self::locate(configured)?;
        let staging_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| SessionError::Staging { path, source }
        };

        fs::create_dir_all(staging_dir).map_err(staging_err(staging_dir))?;
        let file_name = source
            .file_name()
            .ok_or_else(|| SessionError::AdapterNotFound(source.clone()))?;
        let target = staging_dir.join(file_name);
        fs::copy(&source, &target).map_err(staging_err(&target))?;
        make_executable(&target).map_err(staging_err(&target))?;

        tracing::debug!(from = %source.display(), to = %target.display(), "staged capture adapter");
        Ok(Self { path: target })
    }

    /// Use an already staged adapter as-is.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<adapter> --out-dir <out_dir> -- <build program> <build args>`, run
    /// where the build would have run.
    #[must_use]
    pub fn wrap(&self, out_dir: &Path, build: Invocation) -> Invocation {
        let Invocation {
            program,
            args,
            working_dir,
            env,
            env_remove,
        } = build;
        Invocation {
            program: self.path.display().to_string(),
            args: ["--out-dir".to_string(), out_dir.display().to_string(), "--".to_string(), program]
                .into_iter()
                .chain(args)
                .collect(),
            working_dir,
            env,
            env_remove,
        }
    }
}

fn find_known(dir: &Path) -> Option<PathBuf> {
    ADAPTER_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// The compiler invocations recorded by one captured build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CaptureReport {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub captures: Vec<CapturedCompilation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CapturedCompilation {
    #[serde(default)]
    pub compiler: Option<String>,
    #[serde(default)]
    pub executable: String,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub cmd: Vec<String>,
}

impl CaptureReport {
    /// Read [`REPORT_FILE`] from the adapter output directory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file is missing, or `InvalidData` if it
    /// is not a capture report.
    pub fn load(out_dir: &Path) -> std::io::Result<Self> {
        let raw = fs::read_to_string(out_dir.join(REPORT_FILE))?;
        serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.captures.len()
    }
}
