//! PROGOUR web front end — tool catalog and command execution over HTTP
//!
//! Serves the static web UI and a small JSON API on one port. Tool commands
//! and ad-hoc commands run through the host shell with a bounded timeout;
//! the HTTP response waits for the process to finish.

use anyhow::{Context, Result};
use progour_tools::{InstallPlanner, Registry, ShellRunner, WhichProbe};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod pages;
mod server;

use server::{AppState, ExecutionLimits, Server};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config()?;
    init_tracing(&config.logging);

    match &config.source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => warn!("Config file not found, using defaults"),
    }

    // Commands run relative to the web root
    let web_root = std::fs::canonicalize(&config.server.web_root).with_context(|| {
        format!("Web root {} is not accessible", config.server.web_root.display())
    })?;
    std::env::set_current_dir(&web_root)
        .with_context(|| format!("Failed to enter {}", web_root.display()))?;
    pages::prepare_web_root(&web_root)?;

    let registry = Registry::builtin();
    info!("Registered {} built-in tools", registry.tool_count());

    let runner = Arc::new(ShellRunner::new(config.execution.shell.clone()));
    let probe = Arc::new(WhichProbe::new(config.execution.probe_timeout()));
    let installer = InstallPlanner::builtin()
        .with_template(config.install.default_template.clone())
        .with_commands(config.install.commands.clone());

    let state = AppState::new(registry, runner.clone(), probe, installer, web_root.clone())
        .with_limits(ExecutionLimits {
            command_timeout: config.execution.command_timeout(),
            install_timeout: config.execution.install_timeout(),
        });

    let mut server = Server::start(state, &config.server.host, config.server.port).await?;
    let port = server.addr().port();

    info!("PROGOUR-LINUX web server is running (web root: {})", web_root.display());
    info!("Local access:    http://localhost:{port}");
    for ip in server::network_addresses(runner.as_ref()).await {
        info!("Network access:  http://{ip}:{port}");
    }
    info!("Press Ctrl+C to stop the server");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutting down server...");
    server.shutdown();
    server.join().await
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .compact()
            .init();
    }
}
