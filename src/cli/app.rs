//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{sync_cmd, watch};
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "marksync")]
#[command(
    author,
    version,
    about = "Keeps status and completed frontmatter fields in agreement"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Vault root (default: nearest ancestor holding .marksync.toml)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Status settings file (default: .tasknotes/settings.json in the vault)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bring status and completed fields back into agreement
    Sync {
        /// Notes to reconcile, as paths relative to the vault root
        notes: Vec<PathBuf>,

        /// Reconcile every note in the vault
        #[arg(long)]
        all: bool,
    },

    /// Show the resolved vault, settings file, and status vocabulary
    Status,

    /// Watch the vault and reconcile notes as they change
    Watch,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("marksync starting");

    let config = Config::load(cli.vault.as_deref())?;
    output.verbose_ctx("config", &format!("Vault root: {}", config.root.display()));

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| config.settings_path());
    output.verbose_ctx(
        "config",
        &format!("Settings file: {}", settings_path.display()),
    );

    match cli.command {
        Commands::Sync { notes, all } => {
            sync_cmd::run(&output, &config, &settings_path, &notes, all)?
        }
        Commands::Status => sync_cmd::status(&output, &config, &settings_path)?,
        Commands::Watch => watch::run(&output, &config, &settings_path)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
