//! The environment handle shared by every scenario of a run.

use anyhow::Context;
use rig_config::RigConfig;
use rig_core::ServerCapability;
use rig_server::ServerClient;
use rig_session::{Scanner, SystemRunner};

use crate::cli::GlobalFlags;

/// Configuration plus the server client built from it.
///
/// Passed explicitly to the scenario runner; nothing scenario-scoped lives
/// here.
#[derive(Debug)]
pub struct Environment {
    pub config: RigConfig,
    pub client: ServerClient,
}

impl Environment {
    /// Load configuration for the invocation described by `flags`.
    ///
    /// # Errors
    ///
    /// Fails if configuration is invalid or the HTTP client cannot be built.
    pub fn load(flags: &GlobalFlags) -> anyhow::Result<Self> {
        let config = RigConfig::load_with_dotenv(flags.config.as_deref())
            .context("failed to load configuration")?;
        Self::new(config)
    }

    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: RigConfig) -> anyhow::Result<Self> {
        let client = ServerClient::new(&config.server).context("failed to build server client")?;
        Ok(Self { config, client })
    }

    /// Resolve the capability facts of the server and scanner.
    ///
    /// # Errors
    ///
    /// Fails if the server is unreachable or not ready.
    pub async fn probe(&self) -> anyhow::Result<ServerCapability> {
        rig_server::probe(&self.client, self.config.scanner.version())
            .await
            .with_context(|| format!("environment probe of {} failed", self.client.base_url()))
    }

    /// The scanner under test, run as real child processes.
    #[must_use]
    pub fn scanner(&self) -> Scanner<SystemRunner> {
        Scanner::new(&self.config.scanner, &self.config.server, SystemRunner)
    }
}
