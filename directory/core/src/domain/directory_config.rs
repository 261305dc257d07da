// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Directory Configuration Types
//
// Defines the configuration schema for the community directory facilitator:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - XMPP domain and directory identity
// - HTTP API binding and CORS
// - Inbound queue, search reply and event bus sizing
// - Logging and metrics settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::community::{directory_jid, AgentJid};

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "DirectoryConfig";

/// Top-level Kubernetes-style directory configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfigManifest {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "DirectoryConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: DirectoryConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable directory name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfigSpec {
    /// XMPP server domain the directory serves
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Explicit directory JID (defaults to "df@<domain>/admin")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jid: Option<String>,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub event_bus: EventBusConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub host: String,

    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Permissive CORS on every route (the dashboard is served elsewhere)
    #[serde(default = "default_true")]
    pub cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Bounded inbound membership queue; senders wait when it is full
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// How long a searching agent waits for the reply
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Events buffered per subscriber before the oldest are dropped
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus exporter port (disabled when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

fn default_true() -> bool {
    true
}

fn default_domain() -> String {
    "localhost".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    10000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_reply_timeout() -> u64 {
    60
}

fn default_event_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_bind_address(),
            port: default_api_port(),
            cors: true,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: default_reply_timeout(),
        }
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

impl Default for DirectoryConfigSpec {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            jid: None,
            api: ApiConfig::default(),
            queue: QueueConfig::default(),
            search: SearchConfig::default(),
            event_bus: EventBusConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for DirectoryConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "df".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: DirectoryConfigSpec::default(),
        }
    }
}

impl DirectoryConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AEGIS_DF_CONFIG_PATH environment variable
    /// 2. ./aegis-df.yaml (working directory)
    /// 3. ~/.aegis/df.yaml (user home)
    /// 4. /etc/aegis/df.yaml (system, Unix) or C:\ProgramData\Aegis\df.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AEGIS_DF_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./aegis-df.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".aegis").join("df.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/aegis/df.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Aegis\\df.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        if let Ok(domain) = std::env::var("AEGIS_DF_DOMAIN") {
            tracing::info!("Environment override: AEGIS_DF_DOMAIN={}", domain);
            self.spec.domain = domain;
        }

        if let Ok(host) = std::env::var("AEGIS_DF_HOST") {
            tracing::info!("Environment override: AEGIS_DF_HOST={}", host);
            self.spec.api.host = host;
        }

        if let Ok(val) = std::env::var("AEGIS_DF_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: AEGIS_DF_PORT={}", port);
                    self.spec.api.port = port;
                }
                Err(_) => tracing::warn!("Ignoring invalid AEGIS_DF_PORT value: '{}'", val),
            }
        }

        if let Ok(val) = std::env::var("AEGIS_DF_QUEUE_CAPACITY") {
            match val.parse::<usize>() {
                Ok(capacity) => {
                    tracing::info!("Environment override: AEGIS_DF_QUEUE_CAPACITY={}", capacity);
                    self.spec.queue.capacity = capacity;
                }
                Err(_) => tracing::warn!("Ignoring invalid AEGIS_DF_QUEUE_CAPACITY value: '{}'", val),
            }
        }
    }

    /// JID the directory answers on
    pub fn directory_jid(&self) -> AgentJid {
        match &self.spec.jid {
            Some(jid) => AgentJid::new(jid.clone()),
            None => directory_jid(&self.spec.domain),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.domain.is_empty() {
            anyhow::bail!("spec.domain cannot be empty");
        }

        if self.spec.queue.capacity == 0 {
            anyhow::bail!("spec.queue.capacity must be greater than zero");
        }

        if self.spec.event_bus.capacity == 0 {
            anyhow::bail!("spec.event_bus.capacity must be greater than zero");
        }

        if self.spec.search.reply_timeout_secs == 0 {
            anyhow::bail!("spec.search.reply_timeout_secs must be greater than zero");
        }

        Ok(())
    }
}

/// Type alias for convenience
pub type DirectoryConfig = DirectoryConfigManifest;
