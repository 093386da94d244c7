//! General harness configuration.

use serde::{Deserialize, Serialize};

fn default_projects_root() -> String {
    String::from("projects")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Directory sample projects are copied from (relative paths resolve
    /// against the scenario file's directory).
    #[serde(default = "default_projects_root")]
    pub projects_root: String,

    /// Keep each scenario's temporary working directory after the run.
    #[serde(default)]
    pub keep_workdirs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            projects_root: default_projects_root(),
            keep_workdirs: false,
        }
    }
}
