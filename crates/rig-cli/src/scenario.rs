//! Scenario files.
//!
//! A scenario is one TOML file describing a target to provision, the source
//! project to scan, how to build it and what the server must report
//! afterwards. Relative paths resolve against the directory holding the file.
//!
//! ```toml
//! [target]
//! key = "cpp"
//! version = "1.0"
//!
//! [[profiles]]
//! path = "profiles/TestQualityProfileCpp.xml"
//! language = "cpp"
//!
//! [source]
//! project = "CppSolution"
//! capture = true
//!
//! [expect.issues]
//! required = ["cpp:S106"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use rig_core::{Feature, ProjectKey, ServerCapability};
use rig_verify::Expectations;
use serde::Deserialize;

fn default_version() -> String {
    String::from("1.0")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub target: TargetSpec,
    #[serde(default)]
    pub profiles: Vec<ProfileSpec>,
    pub source: SourceSpec,
    #[serde(default)]
    pub scan: ScanSpec,
    /// Scanner build variants this scenario does not apply to.
    #[serde(default)]
    pub skip_when_scanner_version: Vec<String>,
    /// Capability facts the scenario needs; it is skipped without them.
    #[serde(default)]
    pub requires: Vec<Feature>,
    #[serde(default)]
    pub expect: Expectations,

    #[serde(skip)]
    file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub key: String,
    /// Display name; the key when omitted.
    pub name: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

impl TargetSpec {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

/// A quality profile backup to restore and bind to the target.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSpec {
    pub path: PathBuf,
    /// Must match the language inside the backup when given.
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    /// Source project directory, relative to the configured projects root.
    pub project: PathBuf,
    /// Replaces the configured build command.
    pub build: Option<BuildOverride>,
    /// Wrap the build with the capture adapter.
    #[serde(default)]
    pub capture: bool,
    /// The build is expected to exit unsuccessfully.
    #[serde(default)]
    pub expect_build_failure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildOverride {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSpec {
    /// Pass `sonar.verbose=true` to the begin step.
    #[serde(default)]
    pub debug: bool,
    /// Extra analysis properties for the begin step.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Scenario {
    /// Read and validate the scenario at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not a valid scenario or does not
    /// pass [`Scenario::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let mut scenario = Self::parse(&text)
            .with_context(|| format!("invalid scenario {}", path.display()))?;
        scenario.file = path.to_path_buf();
        scenario
            .validate()
            .with_context(|| format!("invalid scenario {}", path.display()))?;
        Ok(scenario)
    }

    /// Parse scenario TOML without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or unknown fields.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Offline checks: the key is well formed and gated expectations are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Names the first problem found.
    pub fn validate(&self) -> anyhow::Result<()> {
        ProjectKey::new(&self.target.key)?;
        self.expect.validate()?;
        if self.source.expect_build_failure && self.expect.queries_server() {
            bail!("a scenario expecting a build failure can only check logs");
        }
        if let Some(build) = &self.source.build
            && build.program.trim().is_empty()
        {
            bail!("source.build.program is empty");
        }
        Ok(())
    }

    /// Like [`Scenario::validate`], and also checks that every referenced
    /// file exists.
    ///
    /// # Errors
    ///
    /// Names the first problem found.
    pub fn check(&self, projects_root: &str) -> anyhow::Result<()> {
        self.validate()?;
        for profile in &self.profiles {
            let path = self.resolve(&profile.path);
            if !path.is_file() {
                bail!("profile {} not found", path.display());
            }
        }
        let project = self.project_dir(projects_root);
        if !project.is_dir() {
            bail!("source project {} not found", project.display());
        }
        Ok(())
    }

    /// File stem of the scenario file, or the target key for parsed text.
    #[must_use]
    pub fn name(&self) -> String {
        self.file
            .file_stem()
            .map_or_else(|| self.target.key.clone(), |s| s.to_string_lossy().into_owned())
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Resolve `path` against the scenario file's directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.file
            .parent()
            .map_or_else(|| path.to_path_buf(), |dir| dir.join(path))
    }

    /// The source project directory under `projects_root`.
    #[must_use]
    pub fn project_dir(&self, projects_root: &str) -> PathBuf {
        self.resolve(&Path::new(projects_root).join(&self.source.project))
    }

    /// Why this scenario does not apply to `capability`, if it does not.
    #[must_use]
    pub fn skip_reason(&self, capability: &ServerCapability) -> Option<String> {
        if let Some(version) = capability.scanner.version.as_deref()
            && self.skip_when_scanner_version.iter().any(|v| v == version)
        {
            return Some(format!("not applicable to scanner {version}"));
        }
        self.requires
            .iter()
            .find(|feature| !capability.has(feature))
            .map(|feature| format!("requires {feature}"))
    }
}
