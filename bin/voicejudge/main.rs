//! Voice Judge CLI
//!
//! Runs the terminal UI by default; subcommands cover one-shot submissions
//! and backend queries.

mod app;
mod commands;
mod style;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use voice_judge::config::ConfigOverrides;
use voice_judge::ClientConfig;

use crate::style::*;

#[derive(Parser)]
#[command(
    name = "voicejudge",
    about = "Voice Judge - score a voice recording with a zk proof and verify it on-chain",
    version
)]
struct Cli {
    /// Config file (default: ~/.voicejudge/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Proving backend base URL
    #[arg(long, env = "VOICEJUDGE_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// Model name sent to the backend
    #[arg(long, env = "VOICEJUDGE_MODEL_NAME", global = true)]
    model_name: Option<String>,

    /// Chain RPC URL for contract reads and verification
    #[arg(long, env = "VOICEJUDGE_NETWORK_URL", global = true)]
    network_url: Option<String>,

    /// Marketplace contract address
    #[arg(long, env = "VOICEJUDGE_MARKETPLACE_ADDRESS", global = true)]
    marketplace_address: Option<String>,

    /// Verifier used when the model descriptor has none
    #[arg(long, env = "VOICEJUDGE_VERIFIER_ADDRESS", global = true)]
    verifier_address: Option<String>,

    /// JSON-RPC wallet endpoint
    #[arg(long, env = "VOICEJUDGE_WALLET_URL", global = true)]
    wallet_url: Option<String>,

    /// Fixed account (overrides --wallet-url)
    #[arg(long, env = "VOICEJUDGE_ACCOUNT", global = true)]
    account: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "VOICEJUDGE_REQUEST_TIMEOUT_SECS", global = true)]
    request_timeout_secs: Option<u64>,

    /// Wallet account polling interval in seconds
    #[arg(long, env = "VOICEJUDGE_ACCOUNT_POLL_SECS", global = true)]
    account_poll_secs: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Ui {
        /// Audio file to preselect
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run the full pipeline for one audio file
    Submit {
        /// Audio file to score
        file: PathBuf,

        /// Verify the proof once it is generated
        #[arg(long)]
        verify: bool,
    },

    /// Show the model descriptor from the marketplace contract
    Model,

    /// Show the credit balance of the active account
    Balance,

    /// Check whether a model name is still available
    CheckName {
        /// Model name to check
        name: String,
    },

    /// Probe the proving backend
    Health,

    /// Show the effective configuration
    Config,

    /// Print the rating for a score
    Rating {
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend_url: self.backend_url.clone(),
            model_name: self.model_name.clone(),
            network_url: self.network_url.clone(),
            marketplace_address: self.marketplace_address.clone(),
            verifier_address: self.verifier_address.clone(),
            wallet_url: self.wallet_url.clone(),
            account: self.account.clone(),
            request_timeout_secs: self.request_timeout_secs,
            account_poll_secs: self.account_poll_secs,
        }
    }

    fn load_config(&self) -> Result<ClientConfig> {
        let mut config =
            ClientConfig::load(self.config.as_deref()).context("Failed to load configuration")?;
        config.apply(self.overrides());
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_ref())?;

    let config = cli.load_config()?;
    tracing::debug!("Using backend {}", config.backend_url);

    match cli.command {
        None => tui::run(&config, None).await,
        Some(Commands::Ui { file }) => tui::run(&config, file).await,
        Some(Commands::Submit { file, verify }) => {
            commands::submit::run(&config, file, verify).await
        }
        Some(Commands::Model) => commands::model::run(&config).await,
        Some(Commands::Balance) => commands::balance::run(&config).await,
        Some(Commands::CheckName { name }) => commands::check_name::run(&config, &name).await,
        Some(Commands::Health) => commands::health::run(&config).await,
        Some(Commands::Config) => commands::config::run(&config, cli.config.as_deref()),
        Some(Commands::Rating { score }) => {
            commands::rating::run(score);
            Ok(())
        }
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

pub fn print_banner() {
    println!();
    println!(
        "  {}{}Voice Judge{} {}",
        colors::BOLD,
        colors::CYAN,
        colors::RESET,
        style_dim(&format!("v{}", env!("CARGO_PKG_VERSION")))
    );
}
