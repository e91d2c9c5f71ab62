//! Multimeter CLI - Screeps console dashboard

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;

use multimeter::{
    tui, CommandTable, FixSuggestion, MultimeterConfig, MultimeterError, ScreepsClient,
    SessionController,
};

#[derive(Parser)]
#[command(name = "multimeter")]
#[command(about = "Multimeter - terminal dashboard for the Screeps console")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/multimeter/config.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Account email
    #[arg(long)]
    email: Option<String>,

    /// Server URL, e.g. http://localhost:21025 for a private server
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Shard used for console commands
    #[arg(long, value_name = "NAME")]
    shard: Option<String>,

    /// Write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let controller = match prepare(cli) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("{} {}", "Fix:".yellow().bold(), suggestion);
            }
            std::process::exit(1);
        }
    };

    if let Err(e) = tui::run(controller).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Everything that can fail before the terminal is touched
fn prepare(cli: Cli) -> Result<SessionController, MultimeterError> {
    let mut config = match &cli.config {
        Some(path) => MultimeterConfig::load_from(path)?,
        None => MultimeterConfig::load()?,
    }
    .with_env();

    if let Some(email) = cli.email {
        config.email = Some(email);
    }
    if let Some(server) = cli.server {
        config.server = server;
    }
    if let Some(shard) = cli.shard {
        config.shard = Some(shard);
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = Some(log_file);
    }

    let credentials = config.credentials()?;
    let options = config.controller_options()?;
    let client = ScreepsClient::new(&config.server, config.shard.clone())?;

    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }
    tracing::info!(server = %config.server, shard = ?config.shard, "starting");

    Ok(SessionController::new(
        Arc::new(client),
        credentials,
        CommandTable::default(),
        options,
    ))
}

/// Log to a file; the TUI owns the terminal
fn init_logging(path: &Path) -> Result<(), MultimeterError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("multimeter=info")),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();

    Ok(())
}
