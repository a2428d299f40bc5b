//! Flow management commands: list, new, copy and show.

use clap::Args;
use colored::Colorize;
use fq_core::config::load_config;
use fq_core::flows::{FlowManager, DEFAULT_ENVIRONMENT};
use fq_protocol::flow_models::Importance;
use std::path::Path;

#[derive(Args)]
pub struct ListArgs {
    /// Only list this environment
    #[arg(long)]
    pub env: Option<String>,
}

#[derive(Args)]
pub struct NewArgs {
    pub flow: String,

    #[arg(long, default_value = DEFAULT_ENVIRONMENT)]
    pub env: String,
}

#[derive(Args)]
pub struct CopyArgs {
    pub flow: String,

    /// Source environment
    #[arg(long)]
    pub from: String,

    /// Target environment
    #[arg(long)]
    pub to: String,
}

#[derive(Args)]
pub struct ShowArgs {
    pub flow: String,

    #[arg(long, default_value = DEFAULT_ENVIRONMENT)]
    pub env: String,
}

async fn manager(root: &Path) -> color_eyre::Result<FlowManager> {
    let config = load_config(root).await?;
    Ok(FlowManager::new(config.flows_dir)?)
}

pub async fn list(args: ListArgs, root: &Path) -> color_eyre::Result<()> {
    let listing = manager(root).await?.list_flows(args.env.as_deref())?;

    for (environment, flows) in listing {
        println!("{}", environment.bold());
        if flows.is_empty() {
            println!("  {}", "(no flows)".dimmed());
        }
        for flow in flows {
            println!("  {flow}");
        }
    }
    Ok(())
}

pub async fn new(args: NewArgs, root: &Path) -> color_eyre::Result<()> {
    let path = manager(root)
        .await?
        .create_template_flow(&args.flow, &args.env)?;
    println!("{} Created {}", "✓".green(), path.display());
    Ok(())
}

pub async fn copy(args: CopyArgs, root: &Path) -> color_eyre::Result<()> {
    let path = manager(root)
        .await?
        .copy_flow(&args.flow, &args.from, &args.to)?;
    println!(
        "{} Copied {} from {} to {}",
        "✓".green(),
        args.flow,
        args.from,
        path.display()
    );
    Ok(())
}

pub async fn show(args: ShowArgs, root: &Path) -> color_eyre::Result<()> {
    let flow = manager(root).await?.load_flow(&args.flow, &args.env)?;

    println!("{} ({})", flow.name.bold(), args.env);
    if !flow.description.is_empty() {
        println!("{}", flow.description);
    }
    println!("base_url: {}", flow.base_url);
    if let Some(login_url) = &flow.login_url {
        println!("login_url: {login_url}");
    }
    if let Some(metadata) = &flow.metadata {
        println!("last updated: {}", metadata.last_updated);
    }

    println!();
    for (index, step) in flow.steps.iter().enumerate() {
        let Some(step) = step else {
            println!("{:>3}. {}", index + 1, "(empty step)".dimmed());
            continue;
        };
        let name = step.name.as_deref().unwrap_or("(unnamed)");
        let action = if step.kind().is_some() {
            step.action.normal()
        } else {
            format!("{} (unknown)", step.action).red()
        };
        let importance = match step.importance {
            Importance::Normal => String::new(),
            other => format!(" [{other}]"),
        };
        println!("{:>3}. {name}: {action}{importance}", index + 1);
    }
    Ok(())
}
