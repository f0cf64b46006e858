use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Target (can override CLI)
    pub base_url: Option<String>,
    pub timeout_sec: Option<u64>,
    pub continue_on_failure: Option<bool>,
    pub logging_level: Option<String>,
    pub report_json: Option<String>,

    /// Workflows to run when none are named on the command line.
    pub workflows: Option<Vec<String>>,

    pub identities: Option<IdentitiesConfig>,
    pub probe: Option<ProbeConfig>,
    pub login: Option<LoginConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct IdentitiesConfig {
    pub password: Option<String>,
    pub email_domain: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ProbeConfig {
    pub concurrency: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LoginConfig {
    /// Response fields, any of which identifies the logged-in user.
    pub user_paths: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
