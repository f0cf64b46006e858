mod file_config;

pub use file_config::{FileConfig, IdentitiesConfig, LoginConfig, ProbeConfig};

use crate::harness::{FailurePolicy, ResponseLoggingLevel};
use crate::identity::IdentityFactory;
use crate::workflows::WorkflowSettings;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_PASSWORD: &str = "password123";
pub const DEFAULT_EMAIL_DOMAIN: &str = "spinwish.com";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub base_url: String,
    pub timeout_sec: u64,
    pub continue_on_failure: bool,
    pub logging_level: ResponseLoggingLevel,
    pub report_json: Option<PathBuf>,
    pub workflows: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            continue_on_failure: false,
            logging_level: ResponseLoggingLevel::default(),
            report_json: None,
            workflows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub timeout_sec: u64,
    /// Overrides every workflow's own policy when set.
    pub policy_override: Option<FailurePolicy>,
    pub logging_level: ResponseLoggingLevel,
    pub report_json: Option<PathBuf>,
    /// Empty means every catalogued workflow.
    pub workflows: Vec<String>,

    pub password: String,
    pub email_domain: String,
    pub concurrency: usize,
    pub login_user_paths: Vec<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present, except for workflow
    /// names given on the command line.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let base_url = file.base_url.unwrap_or_else(|| cli.base_url.clone());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("base_url must be an http(s) URL, got {:?}", base_url);
        }

        let timeout_sec = file.timeout_sec.unwrap_or(cli.timeout_sec);
        if timeout_sec == 0 {
            bail!("timeout_sec must be greater than zero");
        }

        let continue_on_failure = file
            .continue_on_failure
            .unwrap_or(cli.continue_on_failure);
        let policy_override = continue_on_failure.then_some(FailurePolicy::ContinueOnFailure);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or(cli.logging_level);

        let report_json = file
            .report_json
            .map(PathBuf::from)
            .or_else(|| cli.report_json.clone());

        let workflows = if cli.workflows.is_empty() {
            file.workflows.unwrap_or_default()
        } else {
            cli.workflows.clone()
        };

        let identities = file.identities.unwrap_or_default();
        let password = identities
            .password
            .unwrap_or_else(|| DEFAULT_PASSWORD.to_string());
        let email_domain = identities
            .email_domain
            .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string());

        let concurrency = file
            .probe
            .unwrap_or_default()
            .concurrency
            .unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            bail!("probe.concurrency must be greater than zero");
        }

        let login_user_paths = file
            .login
            .unwrap_or_default()
            .user_paths
            .unwrap_or_else(|| vec!["userDetails".to_string(), "user".to_string()]);
        if login_user_paths.is_empty() {
            bail!("login.user_paths must name at least one field");
        }

        Ok(AppConfig {
            base_url,
            timeout_sec,
            policy_override,
            logging_level,
            report_json,
            workflows,
            password,
            email_domain,
            concurrency,
            login_user_paths,
        })
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            concurrency: self.concurrency,
            login_user_paths: self.login_user_paths.clone(),
            identities: IdentityFactory::new(self.password.clone(), self.email_domain.clone()),
        }
    }
}

fn parse_logging_level(s: &str) -> Option<ResponseLoggingLevel> {
    ResponseLoggingLevel::from_str(s, true).ok()
}
