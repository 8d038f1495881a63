//! Command implementations

pub mod principal;
pub mod target;

use std::sync::Arc;

use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::Serialize;
use xavyo_access_policy::client::{build_policy_client, PolicyClient};
use xavyo_access_policy::config::ClientConfig;
use xavyo_access_policy::reconciler::{CreateMode, Reconciler, ReconcilerOptions};

use crate::error::{CliError, CliResult};

/// Options shared by every assignment command.
#[derive(clap::Args, Debug, Clone)]
pub struct EngineArgs {
    /// Fail create when an existing entry differs instead of adopting it
    #[arg(long, global = true)]
    pub strict: bool,

    /// Partition new instance targets are added to (overrides ACCESS_POLICY_PARTITION_KEY)
    #[arg(long, global = true)]
    pub partition_key: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Compact,
}

/// Build the engine from the environment and command-line overrides.
pub fn build_reconciler(args: &EngineArgs) -> CliResult<(Reconciler, Arc<PolicyClient>)> {
    let config = ClientConfig::from_env()?;
    let client = Arc::new(build_policy_client(&config)?);

    let options = ReconcilerOptions {
        partition_key: args
            .partition_key
            .clone()
            .unwrap_or_else(|| config.partition_key.clone()),
        create_mode: if args.strict {
            CreateMode::RejectConflicting
        } else {
            CreateMode::Adopt
        },
    };

    tracing::debug!(?config, ?options, "Configured access-policy reconciler");

    let reconciler = Reconciler::new(client.clone())
        .with_retry(config.retry.clone())
        .with_options(options);
    Ok((reconciler, client))
}

/// Parse a JSON argument given inline or as `@path/to/file.json`.
pub fn load_json<T: DeserializeOwned>(arg: &str) -> CliResult<T> {
    if let Some(path) = arg.strip_prefix('@') {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Io(format!("Failed to read config file '{path}': {e}")))?;
        serde_json::from_str(&content)
            .map_err(|e| CliError::Validation(format!("Invalid JSON in file '{path}': {e}")))
    } else {
        serde_json::from_str(arg).map_err(|e| CliError::Validation(format!("Invalid JSON: {e}")))
    }
}

/// Print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> CliResult<()> {
    let rendered = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Compact => serde_json::to_string(value)?,
    };
    println!("{rendered}");
    Ok(())
}
