//! # Aitaus MCP Server Entry Point
//!
//! Parses CLI arguments, initializes logging, builds the [`Sandbox`] from a
//! TOML config file and/or flags, and serves the MCP protocol over stdio
//! until the client disconnects or a shutdown signal arrives.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::ServiceExt;
use tokio::signal;
use tracing::info;

use crate::config::SandboxConfig;
use crate::mcp_service::AitausMcpService;
use crate::sandbox::Sandbox;
use crate::utils::logging::init_logging;

/// Aitaus MCP Server: workspace-bounded command execution for AI agents.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "aitaus_mcp is an MCP server that lets an agent run allow-listed commands \
without ever resolving a path outside the configured workspace root.

Examples:
  aitaus_mcp --workspace-root /path/to/project
  aitaus_mcp --config aitaus.toml --allow ls --allow cargo"
)]
struct Cli {
    /// Root directory the sandbox is confined to.
    #[arg(long, default_value = ".")]
    workspace_root: PathBuf,

    /// Optional TOML config file; CLI flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Allowed command (repeatable). When absent, a built-in read-only
    /// default set is used.
    #[arg(long = "allow")]
    allowed_commands: Vec<String>,

    /// Per-command timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum captured output bytes per stream.
    #[arg(long)]
    max_output_bytes: Option<usize>,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Log to a rolling file in the cache directory instead of stderr.
    #[arg(long)]
    log_to_file: bool,
}

impl Cli {
    async fn into_config(self) -> Result<SandboxConfig> {
        let mut config = match &self.config {
            Some(path) => SandboxConfig::load(path).await?,
            None => SandboxConfig::new(self.workspace_root.clone()),
        };

        // Flags win over the config file.
        if self.config.is_some() && self.workspace_root != PathBuf::from(".") {
            config.workspace_root = self.workspace_root;
        }
        if !self.allowed_commands.is_empty() {
            config.allowed_commands = self.allowed_commands;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(max) = self.max_output_bytes {
            config.max_output_bytes = max;
        }
        Ok(config)
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    init_logging(log_level, cli.log_to_file)?;

    if std::io::stdin().is_terminal() {
        eprintln!(
            "\naitaus_mcp is an MCP server designed for JSON-RPC communication over stdio."
        );
        eprintln!("It cannot be run directly from an interactive terminal.\n");
        eprintln!("Point your MCP client at it, e.g.:");
        eprintln!("  aitaus_mcp --workspace-root /path/to/project\n");
        std::process::exit(1);
    }

    let config = cli.into_config().await?;
    info!(
        "Starting aitaus_mcp v{} (workspace root: {:?}, timeout: {}s)",
        env!("CARGO_PKG_VERSION"),
        config.workspace_root,
        config.timeout_seconds
    );

    let sandbox =
        Arc::new(Sandbox::new(config).context("Failed to initialize workspace sandbox")?);
    let service = AitausMcpService::new(sandbox)
        .serve(rmcp::transport::stdio())
        .await?;

    tokio::select! {
        result = service.waiting() => {
            info!("MCP client disconnected: {:?}", result?);
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping server");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let sigterm = async {
        #[cfg(unix)]
        {
            let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to setup SIGTERM handler");
            term.recv().await;
        }
        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => info!("Received SIGINT"),
        _ = sigterm => info!("Received SIGTERM"),
    }
}
