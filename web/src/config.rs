//! PROGOUR configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "progour.toml";

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct ProgourConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub install: InstallConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Where the configuration came from, if a file was found
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_web_root")]
    pub web_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_root: default_web_root(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    #[serde(default = "default_install_timeout")]
    pub install_timeout_seconds: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            command_timeout_seconds: default_command_timeout(),
            install_timeout_seconds: default_install_timeout(),
            probe_timeout_seconds: default_probe_timeout(),
        }
    }
}

impl ExecutionConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }
}

#[derive(Debug, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_install_template")]
    pub default_template: String,
    /// Merged over the built-in install table
    #[serde(default)]
    pub commands: HashMap<String, String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            default_template: default_install_template(),
            commands: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8080 }
fn default_web_root() -> PathBuf { PathBuf::from(".") }
fn default_shell() -> String { "/bin/sh".into() }
fn default_command_timeout() -> u64 { 30 }
fn default_install_timeout() -> u64 { 120 }
fn default_probe_timeout() -> u64 { 5 }
fn default_install_template() -> String { progour_tools::install::DEFAULT_INSTALL_TEMPLATE.into() }
fn default_log_level() -> String { "info".into() }

/// Load configuration from `$PROGOUR_CONFIG` (default `progour.toml`),
/// then apply `PROGOUR_HOST` / `PROGOUR_PORT` overrides
pub fn load_config() -> Result<ProgourConfig> {
    let config_path = std::env::var("PROGOUR_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = load_config_from(Path::new(&config_path))?;
    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// Load configuration from a file, falling back to defaults when it is missing
pub fn load_config_from(path: &Path) -> Result<ProgourConfig> {
    if !path.exists() {
        return Ok(ProgourConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let mut config: ProgourConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;
    config.source = Some(path.to_path_buf());
    Ok(config)
}

impl ProgourConfig {
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("PROGOUR_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PROGOUR_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PROGOUR_PORT value: {port}"))?;
        }
        Ok(())
    }
}
