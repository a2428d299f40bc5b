//! `flowqa run`

use crate::output;
use clap::Args;
use color_eyre::eyre::WrapErr;
use fq_core::config::load_config;
use fq_core::driver::{create_driver, DriverKind};
use fq_core::engine::{EngineSettings, FlowEngine};
use fq_core::flows::{FlowManager, DEFAULT_ENVIRONMENT};
use fq_protocol::flow_models::Credentials;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Args)]
pub struct RunArgs {
    /// Flow name, without extension
    pub flow: String,

    /// Environment directory to load the flow from
    #[arg(long, default_value = DEFAULT_ENVIRONMENT)]
    pub env: String,

    /// Log in with this user before the first step
    #[arg(long, requires = "password")]
    pub username: Option<String>,

    #[arg(long, requires = "username")]
    pub password: Option<String>,

    /// Write the JSON result to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run against the in-memory mock driver instead of a browser
    #[arg(long)]
    pub dry_run: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Run a flow. Returns whether every step passed.
pub async fn execute(args: RunArgs, root: &Path) -> color_eyre::Result<bool> {
    let mut config = load_config(root).await?;
    if args.headed {
        config.headless = false;
    }

    let kind = if args.dry_run {
        DriverKind::Mock
    } else {
        DriverKind::Chromium
    };
    let driver = create_driver(kind, &config)
        .await
        .wrap_err_with(|| format!("Failed to start the {kind} driver"))?;
    let flows = FlowManager::new(&config.flows_dir)?;

    let credentials = match (args.username, args.password) {
        (Some(username), Some(password)) => Some(Credentials::new(username, password)),
        _ => None,
    };

    let (events_tx, events_rx) = mpsc::channel(64);
    let engine = FlowEngine::new(driver.clone(), flows, EngineSettings::from(&config))
        .with_events(events_tx);

    let flow_name = args.flow;
    let environment = args.env;
    let run = async move {
        let result = engine
            .execute_flow(&flow_name, &environment, credentials.as_ref())
            .await;
        // Dropping the engine closes the event channel.
        drop(engine);
        result
    };
    let (result, ()) = tokio::join!(run, output::print_events(events_rx));

    if let Err(err) = driver.close().await {
        tracing::warn!(error = %err, "Failed to close browser");
    }

    let result = result?;
    output::print_summary(&result);

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&path, json)
            .wrap_err_with(|| format!("Failed to write results to {}", path.display()))?;
        println!("Results written to {}", path.display());
    }

    Ok(result.is_success())
}
