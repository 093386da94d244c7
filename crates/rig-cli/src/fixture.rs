//! Scenario working copies.
//!
//! Every scenario scans a fresh copy of its source project so that build
//! outputs and scanner state never leak into the next scenario. The copy
//! lives in a temporary directory that is removed on drop, unless the run
//! asked to keep it.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use ignore::WalkBuilder;
use tempfile::TempDir;

/// Subdirectory of the working copy the capture adapter is staged into.
const STAGING_DIR: &str = ".rig";

/// A temporary working copy of one source project.
#[derive(Debug)]
pub struct Workdir {
    dir: Option<TempDir>,
    source_root: PathBuf,
    keep: bool,
}

impl Workdir {
    /// Copy `project` into a new temporary directory.
    ///
    /// Walks without any ignore filters: hidden files, `.gitignore`d build
    /// inputs and solution metadata are all copied.
    ///
    /// # Errors
    ///
    /// Fails if `project` is not a directory or any file cannot be copied.
    pub fn prepare(project: &Path, keep: bool) -> anyhow::Result<Self> {
        if !project.is_dir() {
            bail!("source project {} not found", project.display());
        }
        let dir = tempfile::Builder::new()
            .prefix("scanrig-")
            .tempdir()
            .context("failed to create working directory")?;
        let name = project.file_name().unwrap_or(project.as_os_str());
        let source_root = dir.path().join(name);

        let files = copy_tree(project, &source_root)?;
        tracing::debug!(
            from = %project.display(),
            to = %source_root.display(),
            files,
            "prepared working copy"
        );

        Ok(Self {
            dir: Some(dir),
            source_root,
            keep,
        })
    }

    /// Root of the copied project; the scanner runs here.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Where tools for this scenario are staged, outside the scanned sources.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.source_root
            .parent()
            .unwrap_or(&self.source_root)
            .join(STAGING_DIR)
    }

    /// Where the capture adapter writes its report.
    #[must_use]
    pub fn capture_dir(&self) -> PathBuf {
        self.source_root.join("out")
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take()
            && self.keep
        {
            let path = dir.keep();
            tracing::info!(path = %path.display(), "kept working directory");
        }
    }
}

/// Copy every file below `from` to the same relative path below `to`.
fn copy_tree(from: &Path, to: &Path) -> anyhow::Result<usize> {
    let walker = WalkBuilder::new(from)
        .standard_filters(false)
        .hidden(false)
        .build();

    let mut files = 0;
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", from.display()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .with_context(|| format!("{} escaped {}", entry.path().display(), from.display()))?;
        let target = to.join(relative);

        if entry.file_type().is_some_and(|t| t.is_dir()) {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("failed to copy {}", entry.path().display()))?;
            files += 1;
        }
    }
    Ok(files)
}
