use crate::config::confique_app_config_layer::AppConfigLayer;
use crate::{AppConfig, Outcome, Replay, Script, script::TEMPLATE};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use confique::Config;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "ezballot")]
#[command(about = "Replay election scripts against an authority-managed ledger")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "ezballot.toml")]
    config_path: PathBuf,

    /// Configuration object
    #[command(flatten)]
    config: AppConfigLayer,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script and print the final results as JSON
    Run {
        /// Path to the election script
        script: PathBuf,

        /// Also write a CBOR snapshot of the final ledger here
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Print an example election script
    Template,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let log_level = if self.verbose { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(format!(
                "ezballot_core={log_level},ezballot_cli={log_level},warn"
            ))
            .with_writer(std::io::stderr)
            .init();

        let config = AppConfig::builder()
            .preloaded(self.config)
            .env()
            .file(&self.config_path)
            .load()
            .with_context(|| {
                format!("failed to load config from {}", self.config_path.display())
            })?;

        match self.command {
            Commands::Run { script, snapshot } => run_script(&config, &script, snapshot.as_deref()),
            Commands::Template => {
                print!("{TEMPLATE}");
                Ok(())
            }
        }
    }
}

fn run_script(config: &AppConfig, path: &Path, snapshot: Option<&Path>) -> Result<()> {
    let script = Script::load(path)?;
    info!(script = %path.display(), steps = script.steps.len(), "replaying election script");

    let ledger = Replay::new(&config.ledger, &script).run(&script.steps)?;

    if let Some(snapshot_path) = snapshot {
        let bytes = ledger.snapshot()?;
        std::fs::write(snapshot_path, bytes)
            .with_context(|| format!("failed to write snapshot {}", snapshot_path.display()))?;
        info!(path = %snapshot_path.display(), "snapshot written");
    }

    let outcome = Outcome::of(&ledger, script.steps.len());
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
