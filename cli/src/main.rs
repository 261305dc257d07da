// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Directory Facilitator CLI
//!
//! The `aegis-df` binary runs the community directory and talks to a running
//! one.
//!
//! ## Commands
//!
//! - `aegis-df serve` - Run the directory HTTP server in the foreground
//! - `aegis-df community join|leave|search|groups` - Agent-side operations
//! - `aegis-df config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use aegis_directory::domain::directory_config::DirectoryConfig;
use aegis_directory_cli::commands::{self, CommunityCommand, ConfigCommand};
use aegis_directory_cli::daemon;

/// AEGIS Directory Facilitator - community hierarchy and discovery
#[derive(Parser)]
#[command(name = "aegis-df")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AEGIS_DF_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// HTTP API port (overrides config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AEGIS_DF_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the directory server
    #[command(name = "serve")]
    Serve,

    /// Join, leave and discover communities
    #[command(name = "community")]
    Community {
        #[command(subcommand)]
        command: CommunityCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = DirectoryConfig::load_or_default(cli.config).context("Failed to load configuration")?;
            init_logging(cli.log_level.as_deref().unwrap_or(&config.spec.observability.log_level))?;
            info!("Starting AEGIS directory facilitator");
            daemon::start_server(config, cli.host, cli.port).await
        }
        Commands::Community { command } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"))?;
            commands::community::handle_command(command, cli.config, cli.host, cli.port).await
        }
        Commands::Config { command } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"))?;
            commands::config::handle_command(command, cli.config).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
