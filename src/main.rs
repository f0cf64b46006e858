use anyhow::{Context, Result};
use clap::Parser;
use spinwish_harness::client::ApiClient;
use spinwish_harness::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SEC,
};
use spinwish_harness::harness::{
    JsonReporter, Reporter, ResponseLoggingLevel, RunSummary, TracingReporter, WorkflowRunner,
};
use spinwish_harness::workflows::WorkflowCatalog;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[clap(about = "Runs workflow-driven integration tests against a SpinWish API")]
struct CliArgs {
    /// Workflows to run. Runs every workflow when empty.
    pub workflows: Vec<String>,

    /// Base URL of the SpinWish API under test.
    #[clap(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Path to a TOML config file. Its values override the flags.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Timeout in seconds for each request.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SEC)]
    pub timeout_sec: u64,

    /// Keep running steps after an assertion failure.
    #[clap(long)]
    pub continue_on_failure: bool,

    /// How much of each response to log.
    #[clap(long, default_value = "status")]
    pub logging_level: ResponseLoggingLevel,

    /// Write every run as JSON to this file.
    #[clap(long)]
    pub report_json: Option<PathBuf>,

    /// List the available workflows and exit.
    #[clap(long)]
    pub list: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            base_url: self.base_url.clone(),
            timeout_sec: self.timeout_sec,
            continue_on_failure: self.continue_on_failure,
            logging_level: self.logging_level,
            report_json: self.report_json.clone(),
            workflows: self.workflows.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    match run(cli_args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(2)
        }
    }
}

/// Runs the selected workflows. `Ok(false)` means the API failed a check;
/// `Err` means the harness itself could not do its job.
async fn run(cli_args: CliArgs) -> Result<bool> {
    let catalog = WorkflowCatalog::builtin();

    if cli_args.list {
        for (name, description) in catalog.entries() {
            println!("{:<24} {}", name, description);
        }
        return Ok(true);
    }

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let workflows = catalog.select(&config.workflows, &config.workflow_settings())?;
    info!(
        "Running {} workflow(s) against {} (timeout {}s)",
        workflows.len(),
        config.base_url,
        config.timeout_sec
    );

    let transport = Arc::new(ApiClient::new(config.base_url.clone(), config.timeout_sec));
    let runner = WorkflowRunner::new(transport).with_policy(config.policy_override);

    let tracing_reporter = TracingReporter::new(config.logging_level);
    let summary = RunSummary::new();
    let json_reporter = JsonReporter::new();
    let reporters: [&dyn Reporter; 3] = [&tracing_reporter, &summary, &json_reporter];

    let outcome = runner.run_all(&workflows, &reporters).await;

    // Runs finished before a malformed workflow still get summarized.
    println!("{}", summary.render());

    if let Some(path) = &config.report_json {
        json_reporter.write_to(path)?;
    }

    outcome.context("Stopped at a malformed workflow")?;
    Ok(summary.all_passed())
}
