// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Community commands, run against a live directory
//!
//! Commands: join, leave, search, groups

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use aegis_directory::domain::directory_config::DirectoryConfig;
use aegis_directory_sdk::{room_jids, AgentJid, CommunityPath, DirectoryClient};

#[derive(Subcommand)]
pub enum CommunityCommand {
    /// Join the leaf community of a path
    Join {
        /// Community path, root first (e.g. peak/a0/b0)
        #[arg(value_name = "PATH")]
        path: String,

        /// Tag to attach to the leaf (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[command(flatten)]
        target: Target,
    },

    /// Leave the leaf community of a path
    Leave {
        #[arg(value_name = "PATH")]
        path: String,

        #[command(flatten)]
        target: Target,
    },

    /// Find communities carrying every given tag
    Search {
        #[arg(value_name = "TAG", required = true)]
        tags: Vec<String>,

        #[command(flatten)]
        target: Target,
    },

    /// Show the current hierarchy
    Groups {
        /// Report live room occupancy instead of recorded members
        #[arg(long)]
        refresh: bool,

        /// Print raw JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        target: Target,
    },
}

/// Where to reach the directory and on whose behalf.
#[derive(clap::Args)]
pub struct Target {
    /// Directory base URL (default: derived from config)
    #[arg(long, env = "AEGIS_DF_URL")]
    url: Option<String>,

    /// Agent JID the request is made for
    #[arg(long, env = "AEGIS_AGENT_JID", default_value = "cli@localhost")]
    sender: String,

    /// Domain of the chat server (default: from config)
    #[arg(long)]
    domain: Option<String>,
}

struct Resolved {
    client: DirectoryClient,
    domain: String,
}

pub async fn handle_command(
    command: CommunityCommand,
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let config = DirectoryConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let connect = |target: Target| resolve(target, &config, host.as_deref(), port);

    match command {
        CommunityCommand::Join { path, tags, target } => join(connect(target), &path, tags).await,
        CommunityCommand::Leave { path, target } => leave(connect(target), &path).await,
        CommunityCommand::Search { tags, target } => search(connect(target), tags).await,
        CommunityCommand::Groups { refresh, json, target } => groups(connect(target), refresh, json).await,
    }
}

fn resolve(target: Target, config: &DirectoryConfig, host: Option<&str>, port: Option<u16>) -> Resolved {
    let url = target
        .url
        .unwrap_or_else(|| base_url(host.unwrap_or(&config.spec.api.host), port.unwrap_or(config.spec.api.port)));
    let client = DirectoryClient::new(url, AgentJid::new(target.sender))
        .with_reply_timeout(Duration::from_secs(config.spec.search.reply_timeout_secs));

    Resolved {
        client,
        domain: target.domain.unwrap_or_else(|| config.spec.domain.clone()),
    }
}

/// Base URL for a configured bind address. A wildcard bind is reached on loopback.
pub fn base_url(host: &str, port: u16) -> String {
    let host = match host {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        other => other,
    };
    format!("http://{}:{}", host, port)
}

async fn join(target: Resolved, path: &str, tags: Vec<String>) -> Result<()> {
    let parsed = CommunityPath::parse(path).with_context(|| format!("Invalid community path '{}'", path))?;

    target
        .client
        .join_community(path, &target.domain, tags)
        .await
        .context("Failed to join community")?;

    println!(
        "{}",
        format!("✓ {} joining {}", target.client.sender(), parsed).green()
    );
    println!("{}", "Rooms to occupy:".bold());
    for room in room_jids(&parsed, &target.domain) {
        println!("  {}", room);
    }

    Ok(())
}

async fn leave(target: Resolved, path: &str) -> Result<()> {
    target
        .client
        .leave_community(path, &target.domain)
        .await
        .context("Failed to leave community")?;

    println!(
        "{}",
        format!("✓ {} leaving {}", target.client.sender(), path).green()
    );

    Ok(())
}

async fn search(target: Resolved, tags: Vec<String>) -> Result<()> {
    let communities = target
        .client
        .search_communities(tags.clone())
        .await
        .context("Community search failed")?;

    if communities.is_empty() {
        println!("{}", format!("No communities tagged {}", tags.join(" + ")).yellow());
        return Ok(());
    }

    println!("{}", format!("Communities tagged {}:", tags.join(" + ")).bold());
    for name in communities {
        println!("  {}", name);
    }

    Ok(())
}

async fn groups(target: Resolved, refresh: bool, json: bool) -> Result<()> {
    if refresh {
        let groups = target.client.refresh_groups().await.context("Failed to refresh groups")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&groups)?);
            return Ok(());
        }
        print_nodes(&groups.nodes, |name| {
            format!("{} online", groups.node_members.get(name).copied().unwrap_or(0))
        });
        return Ok(());
    }

    let groups = target.client.groups().await.context("Failed to fetch groups")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }
    print_nodes(&groups.nodes, |name| {
        let members = groups.node_members.get(name).map(Vec::len).unwrap_or(0);
        format!("{} member(s)", members)
    });
    if !groups.links.is_empty() {
        println!("{}", "Links:".bold());
        for (parent, child) in &groups.links {
            println!("  {} → {}", parent, child);
        }
    }

    Ok(())
}

fn print_nodes(nodes: &[(String, String, String)], describe: impl Fn(&str) -> String) {
    if nodes.is_empty() {
        println!("{}", "No communities registered".yellow());
        return;
    }

    println!("{}", "Communities:".bold());
    for (name, level, domain) in nodes {
        println!(
            "  {} {} {}",
            name.bold(),
            format!("[{} @ {}]", level, domain).dimmed(),
            describe(name)
        );
    }
}
