//! `flowqa init`

use clap::Args;
use color_eyre::eyre::WrapErr;
use colored::Colorize;
use fq_core::init::{generate_project, InitOptions};
use std::path::Path;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing flowqa.toml and example flow
    #[arg(long)]
    pub force: bool,
}

pub async fn execute(args: InitArgs, root: &Path) -> color_eyre::Result<()> {
    let options = InitOptions {
        target_dir: root.to_path_buf(),
        force: args.force,
    };
    generate_project(options)
        .await
        .wrap_err("Failed to initialize project")?;

    println!("{} Initialized flow-qa project in {}", "✓".green(), root.display());
    println!("  Edit flowqa.toml, then try: flowqa run example --dry-run");
    Ok(())
}
