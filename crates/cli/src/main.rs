//! TerraSync CLI
//!
//! Thin command-line surface over the synchronization core.
//!
//! # Commands
//!
//! - `sync` - run one full synchronization and print per-step outcomes
//! - `probe` - check whether the remote endpoint is reachable
//! - `export` - export local records to the remote endpoint
//!
//! # Exit codes (sync)
//!
//! - 0: every step passed
//! - 1: a step after test-connection failed
//! - 2: connectivity could not be established

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// TerraSync property-assessment data exchange.
#[derive(Parser)]
#[command(name = "terrasync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a config file (default: environment, then ./config.toml)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Local JSON file with property records
    #[arg(global = true, long, default_value = "properties.json")]
    records: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full synchronization
    Sync,

    /// Check whether the remote endpoint is reachable
    Probe,

    /// Export records to the remote endpoint without a full run
    Export {
        /// Export only this record instead of the whole set
        #[arg(long)]
        property_id: Option<String>,

        /// Remote destination (default: the configured export path)
        #[arg(long)]
        remote_path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Credentials commonly live in a .env file during development.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // RUST_LOG wins; --verbose only raises the fallback level.
    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Sync => commands::sync::run(config, &cli.records).await,
        Commands::Probe => commands::probe::run(&config).await,
        Commands::Export { property_id, remote_path } => {
            commands::export::run(config, &cli.records, property_id.as_deref(), remote_path).await
        }
    }
}

fn load_config(cli: &Cli) -> terrasync_domain::Result<terrasync_domain::Config> {
    match &cli.config {
        Some(path) => terrasync_infra::config::load_from_file(Some(path)),
        None => terrasync_infra::config::load(),
    }
}
