use std::fmt;

use rig_core::ServerCapability;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::Verdict;
use crate::context::Environment;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ProbeResponse {
    server: String,
    #[serde(flatten)]
    capability: ServerCapability,
}

impl fmt::Display for ProbeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "server:  {} ({})", self.server, self.capability.server_version)?;
        writeln!(
            f,
            "scanner: {}",
            self.capability.scanner.version.as_deref().unwrap_or("unknown")
        )?;
        if self.capability.plugins.is_empty() {
            return writeln!(f, "plugins: none");
        }
        writeln!(f, "plugins:")?;
        for (key, version) in &self.capability.plugins {
            writeln!(f, "  {key} {version}")?;
        }
        Ok(())
    }
}

/// Handle `rig probe`.
pub async fn handle(flags: &GlobalFlags) -> anyhow::Result<Verdict> {
    let env = Environment::load(flags)?;
    let capability = env.probe().await?;
    output(
        &ProbeResponse {
            server: env.client.base_url().to_string(),
            capability,
        },
        flags.format,
    )?;
    Ok(Verdict::Passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lists_plugins() {
        let response = ProbeResponse {
            server: "http://localhost:9000".into(),
            capability: ServerCapability::new("7.4.0.18908".parse().unwrap())
                .with_plugin("cpp", "6.0")
                .with_plugin("vbnet", "7.10"),
        };
        let text = response.to_string();
        assert!(text.starts_with("server:  http://localhost:9000 (7.4.0.18908)\nscanner: unknown\n"));
        assert!(text.contains("  cpp 6.0\n  vbnet 7.10\n"));
    }
}
