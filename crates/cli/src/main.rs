//! flowqa - declarative web QA runner.
//!
//! Runs YAML flows against a browser and reports passed, failed and skipped
//! steps.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use commands::{flows, init, run};

#[derive(Parser)]
#[command(name = "flowqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root containing flowqa.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write flowqa.toml and the flows directory
    Init(init::InitArgs),

    /// Run a flow
    Run(run::RunArgs),

    /// List flows per environment
    List(flows::ListArgs),

    /// Create a flow from the starter template
    New(flows::NewArgs),

    /// Copy a flow between environments
    Copy(flows::CopyArgs),

    /// Print a flow's steps
    Show(flows::ShowArgs),
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init(args) => init::execute(args, &cli.root).await?,
        Commands::Run(args) => {
            let succeeded = run::execute(args, &cli.root).await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Commands::List(args) => flows::list(args, &cli.root).await?,
        Commands::New(args) => flows::new(args, &cli.root).await?,
        Commands::Copy(args) => flows::copy(args, &cli.root).await?,
        Commands::Show(args) => flows::show(args, &cli.root).await?,
    }

    Ok(())
}
