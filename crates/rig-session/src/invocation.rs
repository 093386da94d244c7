//! A fully described external process invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Scan properties whose values must never appear in logs or reports.
pub const SENSITIVE_PROPERTIES: &[&str] = &["sonar.login", "sonar.password", "sonar.token"];

const REDACTED: &str = "******";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Variables set (or overridden) in the child environment.
    pub env: BTreeMap<String, String>,
    /// Variables removed from the inherited environment.
    pub env_remove: Vec<String>,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
            env_remove: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// The command line with sensitive property values masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|arg| redact_arg(arg)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Mask the value of `/d:key=value` or `-Dkey=value` when `key` is sensitive.
fn redact_arg(arg: &str) -> String {
    let Some(body) = arg.strip_prefix("/d:").or_else(|| arg.strip_prefix("-D")) else {
        return arg.to_string();
    };
    match body.split_once('=') {
        Some((key, _)) if SENSITIVE_PROPERTIES.contains(&key) => {
            let prefix = &arg[..arg.len() - body.len()];
            format!("{prefix}{key}={REDACTED}")
        }
        _ => arg.to_string(),
    }
}
