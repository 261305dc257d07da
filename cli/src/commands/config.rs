// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use aegis_directory::domain::directory_config::DirectoryConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the resolved manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./aegis-df.yaml)
        #[arg(short, long, default_value = "./aegis-df.yaml")]
        output: PathBuf,

        /// Chat server domain the directory serves
        #[arg(long, default_value = "localhost")]
        domain: String,

        /// Fill in optional settings (explicit JID, metrics port)
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate {
            output,
            domain,
            examples,
        } => generate(&output, &domain, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, yaml: bool) -> Result<()> {
    let config = DirectoryConfig::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. AEGIS_DF_CONFIG_PATH: {}",
            std::env::var("AEGIS_DF_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./aegis-df.yaml");
        println!("  4. ~/.aegis/df.yaml");
        println!("  5. /etc/aegis/df.yaml");
        println!();
    }

    if yaml {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Directory:".bold());
    println!("  Name: {}", config.metadata.name);
    println!("  Domain: {}", spec.domain);
    println!("  JID: {}", config.directory_jid());
    println!();

    println!("{}", "HTTP API:".bold());
    println!("  Listen: {}:{}", spec.api.host, spec.api.port);
    println!("  CORS: {}", if spec.api.cors { "permissive" } else { "disabled" });
    println!();

    println!("{}", "Runtime:".bold());
    println!("  Queue capacity: {}", spec.queue.capacity);
    println!("  Event bus capacity: {}", spec.event_bus.capacity);
    println!("  Search reply timeout: {}s", spec.search.reply_timeout_secs);
    println!();

    println!("{}", "Observability:".bold());
    println!("  Log level: {}", spec.observability.log_level);
    match spec.observability.metrics_port {
        Some(port) => println!("  Metrics: :{}", port),
        None => println!("  Metrics: {}", "(disabled)".dimmed()),
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = DirectoryConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path, domain: &str, with_examples: bool) -> Result<()> {
    let config = sample_config(domain, with_examples);

    config
        .to_yaml_file(output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn sample_config(domain: &str, with_examples: bool) -> DirectoryConfig {
    let mut config = DirectoryConfig::default();
    config.spec.domain = domain.to_string();
    if with_examples {
        config.spec.jid = Some(config.directory_jid().to_string());
        config.spec.observability.metrics_port = Some(9100);
    }
    config
}
